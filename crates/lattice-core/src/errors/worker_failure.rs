/// A reactor chunk that did not complete. Isolated to that chunk.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkerFailure {
    #[error("chunk {chunk} panicked: {message}")]
    Panicked { chunk: usize, message: String },

    #[error("chunk {chunk} failed: {reason}")]
    Failed { chunk: usize, reason: String },

    #[error("chunk {chunk} timed out after {timeout_ms}ms")]
    TimedOut { chunk: usize, timeout_ms: u64 },

    #[error("worker pool unavailable: {reason}")]
    PoolUnavailable { reason: String },
}

impl WorkerFailure {
    /// The chunk index this failure belongs to, if any.
    pub fn chunk(&self) -> Option<usize> {
        match self {
            Self::Panicked { chunk, .. }
            | Self::Failed { chunk, .. }
            | Self::TimedOut { chunk, .. } => Some(*chunk),
            Self::PoolUnavailable { .. } => None,
        }
    }
}
