/// Pairwise resonance scorer. Treated as a black box; must be pure so it can
/// be shared read-only across reactor workers.
pub trait IResonanceScorer: Send + Sync {
    /// Score two vectors. Result in [-1, 1]; strongly negative scores mark
    /// contradictions, strongly positive ones agreement.
    fn score(&self, a: &[f32], b: &[f32]) -> f64;
}
