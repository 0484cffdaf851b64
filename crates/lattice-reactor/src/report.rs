use serde::{Deserialize, Serialize};

/// A chunk that panicked or errored. Its candidates were not written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub cycle: usize,
    pub chunk: usize,
    pub reason: String,
}

/// Summary of one `run_batch` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identity slots in chunks that completed, summed over cycles.
    pub processed: usize,
    /// Relation identities that did not exist before this batch.
    pub new_relations: usize,
    /// Candidates written back (each one resolution).
    pub resolutions: usize,
    pub chunk_failures: Vec<ChunkFailure>,
    /// Chunks whose results were discarded for overrunning the timeout.
    pub timed_out_chunks: usize,
    /// Cycles executed.
    pub cycles: usize,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.chunk_failures.is_empty() && self.timed_out_chunks == 0
    }
}
