pub mod embedding;
pub mod resonance;
pub mod storage;

pub use embedding::IEmbeddingProvider;
pub use resonance::IResonanceScorer;
pub use storage::ILatticeStorage;
