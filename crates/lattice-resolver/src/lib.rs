//! # lattice-resolver
//!
//! Contradiction lattice resolution. Each resolved pair of identities owns
//! one echo form, keyed by an order-independent anchor; every resolution
//! appends one entropy-weighted event term to it.

pub mod anchor;
pub mod resolver;

pub use anchor::{group_anchor, lattice_anchor};
pub use resolver::LatticeResolver;
