//! The unified entity model: content nodes and relationship records.

pub mod base;
pub mod symbols;
pub mod types;

pub use base::Identity;
pub use symbols::{symbols_from_text, WeightedSymbol};
pub use types::IdentityType;
