use serde::{Deserialize, Serialize};

use super::defaults;

/// Batch reactor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Fixed worker pool size.
    pub workers: usize,
    /// Identities per chunk.
    pub chunk_size: usize,
    /// Passes over the input.
    pub cycles: usize,
    /// Per-chunk deadline. Results arriving later are discarded.
    pub chunk_timeout_ms: u64,
    /// Minimum |score| for a pair to become a relation.
    pub resonance_threshold: f64,
    /// Max cached embeddings in the coordinator.
    pub embedding_cache_capacity: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            workers: defaults::DEFAULT_WORKERS,
            chunk_size: defaults::DEFAULT_CHUNK_SIZE,
            cycles: defaults::DEFAULT_CYCLES,
            chunk_timeout_ms: defaults::DEFAULT_CHUNK_TIMEOUT_MS,
            resonance_threshold: defaults::DEFAULT_RESONANCE_THRESHOLD,
            embedding_cache_capacity: defaults::DEFAULT_EMBEDDING_CACHE_CAPACITY,
        }
    }
}
