pub mod config_error;
pub mod mirror_error;
pub mod storage_error;
pub mod validation_error;
pub mod worker_failure;

pub use config_error::ConfigError;
pub use mirror_error::MirrorError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;
pub use worker_failure::WorkerFailure;

/// Top-level error for every lattice operation.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("mirror error: {0}")]
    MirrorError(#[from] MirrorError),

    #[error("worker failure: {0}")]
    WorkerFailure(#[from] WorkerFailure),

    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("echo form not found: {anchor}")]
    FormNotFound { anchor: String },
}

pub type LatticeResult<T> = Result<T, LatticeError>;
