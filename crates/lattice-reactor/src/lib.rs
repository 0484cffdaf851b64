//! # lattice-reactor
//!
//! Batch resonance scanning. The coordinator embeds identities, splits them
//! into chunks, fans the chunks out to a fixed rayon pool, and writes every
//! resulting relation back serially through the resolver.

pub mod cache;
pub mod chunk;
pub mod embedding;
pub mod pool;
pub mod reactor;
pub mod report;
pub mod scoring;

pub use chunk::{ChunkJob, RelationCandidate};
pub use embedding::TermHashEmbedder;
pub use reactor::BatchReactor;
pub use report::{BatchReport, ChunkFailure};
pub use scoring::CosineScorer;
