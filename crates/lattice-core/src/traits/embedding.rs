use crate::errors::LatticeResult;

/// Text embedding collaborator. Treated as a black box.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> LatticeResult<Vec<f32>>;

    /// Output dimensionality.
    fn dimensions(&self) -> usize;

    /// Provider name, used as part of the embedding cache key.
    fn name(&self) -> &str;
}
