use lattice_core::traits::IResonanceScorer;

/// Cosine similarity, clamped to [-1, 1]. Zero for empty, zero-norm, or
/// mismatched vectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineScorer;

impl IResonanceScorer for CosineScorer {
    fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let mut dot = 0.0f64;
        let mut na = 0.0f64;
        let mut nb = 0.0f64;
        for (x, y) in a.iter().zip(b) {
            let (x, y) = (f64::from(*x), f64::from(*y));
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
    }
}
