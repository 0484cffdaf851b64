//! Dual-write compatibility layer for the legacy node/relation schema.
//!
//! Phase machine: `Off -> DualWrite -> LegacyRetired`, forward only.

pub mod consistency;
pub mod dual_write;
pub mod stats;

pub use consistency::{ConsistencyReport, FieldDiff};
pub use dual_write::DualWriteStorage;
pub use stats::DualWriteStats;
