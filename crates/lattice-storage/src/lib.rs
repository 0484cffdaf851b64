//! # lattice-storage
//!
//! SQLite persistence for the contradiction lattice: one serialized write
//! connection, a WAL read pool for file-backed databases, versioned
//! migrations, and the dual-write compatibility layer that mirrors
//! identities into the legacy schema during a migration.

pub mod compat;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use compat::{ConsistencyReport, DualWriteStats, DualWriteStorage, FieldDiff};
pub use engine::StorageEngine;
pub use queries::maintenance::{DecayPreview, StorageStats};

use lattice_core::errors::{LatticeError, StorageError};

/// Wrap a backend failure message as a [`LatticeError`].
pub(crate) fn to_storage_err(message: impl Into<String>) -> LatticeError {
    LatticeError::StorageError(StorageError::SqliteError {
        message: message.into(),
    })
}

/// A row that could not be mapped back into a model.
pub(crate) fn corrupt_row(table: &str, details: impl Into<String>) -> LatticeError {
    LatticeError::StorageError(StorageError::CorruptRow {
        table: table.to_string(),
        details: details.into(),
    })
}
