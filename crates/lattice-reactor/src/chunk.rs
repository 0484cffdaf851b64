//! DTOs crossing the coordinator/worker boundary, and chunk planning.
//!
//! Workers only ever see these plain values: no store handles, no
//! identities, nothing shared and mutable.

use serde::{Deserialize, Serialize};

/// One unit of work: every pair inside `ids` gets scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkJob {
    pub cycle: usize,
    pub chunk: usize,
    pub ids: Vec<String>,
    /// `embeddings[i]` belongs to `ids[i]`.
    pub embeddings: Vec<Vec<f32>>,
    /// Minimum |score| for a pair to be reported.
    pub threshold: f64,
}

impl ChunkJob {
    pub fn pair_count(&self) -> usize {
        let n = self.ids.len();
        n * n.saturating_sub(1) / 2
    }
}

/// A pair whose resonance crossed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub source_id: String,
    pub target_id: String,
    /// In [-1, 1]. Negative means contradiction, positive agreement.
    pub score: f64,
}

impl RelationCandidate {
    pub fn is_contradiction(&self) -> bool {
        self.score < 0.0
    }
}

/// Partition `0..n` into chunks of `chunk_size`, rotated by half a chunk per
/// cycle so pairs split across a boundary in one cycle meet in the next.
pub fn plan_chunks(n: usize, chunk_size: usize, cycle: usize) -> Vec<Vec<usize>> {
    if n == 0 || chunk_size == 0 {
        return Vec::new();
    }
    let offset = (cycle * (chunk_size / 2).max(1)) % n;
    let order: Vec<usize> = (0..n).map(|i| (i + offset) % n).collect();
    order.chunks(chunk_size).map(<[usize]>::to_vec).collect()
}
