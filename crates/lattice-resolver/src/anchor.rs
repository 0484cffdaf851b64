use lattice_core::hash::short_hash;

const ANCHOR_PREFIX: &str = "cls";

/// Anchor of the form shared by `a` and `b` in `domain`. Symmetric in `a`, `b`.
pub fn lattice_anchor(a: &str, b: &str, domain: &str) -> String {
    group_anchor(&[a, b], domain)
}

/// Anchor over any number of ids. Order and duplicates do not matter.
pub fn group_anchor(ids: &[&str], domain: &str) -> String {
    let mut sorted: Vec<&str> = ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(sorted.len() + 1);
    parts.push(domain.as_bytes());
    parts.extend(sorted.iter().map(|s| s.as_bytes()));
    format!("{ANCHOR_PREFIX}_{}", short_hash(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_is_symmetric_and_domain_scoped() {
        assert_eq!(lattice_anchor("x", "y", "d"), lattice_anchor("y", "x", "d"));
        assert_ne!(lattice_anchor("x", "y", "d"), lattice_anchor("x", "y", "e"));
        assert_ne!(lattice_anchor("x", "y", "d"), lattice_anchor("x", "z", "d"));
        assert!(lattice_anchor("x", "y", "d").starts_with("cls_"));
    }

    #[test]
    fn group_anchor_ignores_order_and_duplicates() {
        assert_eq!(
            group_anchor(&["c", "a", "b"], "d"),
            group_anchor(&["b", "c", "a", "a"], "d")
        );
    }
}
