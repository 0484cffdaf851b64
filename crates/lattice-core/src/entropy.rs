//! Shannon entropy over weighted terms and relationships, and the
//! entropy-adaptive decay constant derived from it.
//!
//! ```text
//! H(w)        = -Σ p_i · log2(p_i),   p_i = w_i / Σ w
//! tau_eff     = tau_base · (1 + H)
//! decay(age)  = exp(-age / tau_eff)
//! ```
//!
//! Inputs are assumed sanitised (finite, non-negative). Models validate
//! their weights at construction, so nothing here re-checks them.

/// Shannon entropy (bits) of `weights` normalised to a distribution.
///
/// Returns 0.0 for empty input, a single weight, or an all-zero vector.
pub fn shannon_entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if weights.len() < 2 || total <= 0.0 {
        return 0.0;
    }
    let h = weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = w / total;
            -p * p.log2()
        })
        .sum::<f64>();
    // Rounding can leave a tiny negative residue for near-degenerate input.
    h.max(0.0)
}

/// Entropy over term intensities of an EchoForm.
pub fn term_entropy<I>(intensities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let weights: Vec<f64> = intensities.into_iter().collect();
    shannon_entropy(&weights)
}

/// Entropy contribution of a relation's `count` relationships, scaled by
/// the relation's confidence in [0, 1].
///
/// `count` evenly weighted relationships carry `log2(count)` bits.
pub fn relationship_entropy(count: usize, confidence: f64) -> f64 {
    if count < 2 {
        return 0.0;
    }
    (count as f64).log2() * confidence.clamp(0.0, 1.0)
}

/// Scale a base time constant by information content: `tau · (1 + entropy)`.
pub fn adaptive_tau(base_tau: f64, entropy: f64) -> f64 {
    base_tau * (1.0 + entropy.max(0.0))
}

/// `exp(-age / adaptive_tau(base_tau, entropy))`, in (0, 1] for finite age ≥ 0.
///
/// A non-positive `base_tau` disables decay (returns 1.0) rather than dividing by zero.
pub fn entropy_weighted_decay(age: f64, base_tau: f64, entropy: f64) -> f64 {
    let tau = adaptive_tau(base_tau, entropy);
    if tau <= 0.0 {
        return 1.0;
    }
    (-age.max(0.0) / tau).exp()
}

/// Plain exponential decay with a fixed time constant.
pub fn fixed_decay(age: f64, tau: f64) -> f64 {
    if tau <= 0.0 {
        return 1.0;
    }
    (-age.max(0.0) / tau).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs_have_zero_entropy() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[3.0]), 0.0);
        assert_eq!(shannon_entropy(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn uniform_weights_give_log2_n() {
        let h = shannon_entropy(&[1.0, 1.0, 1.0, 1.0]);
        assert!((h - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_do_not_contribute() {
        let a = shannon_entropy(&[1.0, 1.0]);
        let b = shannon_entropy(&[1.0, 1.0, 0.0]);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn relationship_entropy_scales_with_confidence() {
        assert_eq!(relationship_entropy(1, 1.0), 0.0);
        assert!((relationship_entropy(2, 1.0) - 1.0).abs() < 1e-12);
        assert!((relationship_entropy(2, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn adaptive_tau_grows_with_entropy() {
        assert_eq!(adaptive_tau(2.0, 0.0), 2.0);
        assert_eq!(adaptive_tau(2.0, 1.5), 5.0);
    }

    #[test]
    fn decay_at_zero_age_is_one() {
        assert_eq!(entropy_weighted_decay(0.0, 1.0, 0.7), 1.0);
        let d = entropy_weighted_decay(3.0, 1.0, 0.7);
        assert!(d > 0.0 && d < 1.0);
    }
}
