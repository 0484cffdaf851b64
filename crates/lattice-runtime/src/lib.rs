//! # lattice-runtime
//!
//! Composition root. Opens the database from [`LatticeConfig`], wraps it
//! in the dual-write layer, and hands it to the resolver and reactor.
//!
//! [`LatticeConfig`]: lattice_core::config::LatticeConfig

pub mod runtime;
pub mod tracing_setup;

pub use runtime::LatticeRuntime;
pub use tracing_setup::{init_tracing, init_tracing_with_default};
