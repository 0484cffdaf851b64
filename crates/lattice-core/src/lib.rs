//! # lattice-core
//!
//! Foundation crate for the contradiction lattice.
//! Defines the Identity and EchoForm models, entropy math, errors, config,
//! constants, and the storage / collaborator traits.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod entropy;
pub mod errors;
pub mod form;
pub mod hash;
pub mod identity;
pub mod time;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::LatticeConfig;
pub use errors::{LatticeError, LatticeResult};
pub use form::{DecayPolicy, EchoForm, FormPhase, Term, TermRole};
pub use identity::{Identity, IdentityType, WeightedSymbol};
