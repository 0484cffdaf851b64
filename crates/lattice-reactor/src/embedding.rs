//! Default embedding provider: signed feature hashing over text symbols.
//!
//! Dependency-free and deterministic, so the reactor runs out of the box.
//! Real deployments plug in a model-backed [`IEmbeddingProvider`].

use lattice_core::errors::LatticeResult;
use lattice_core::identity::symbols_from_text;
use lattice_core::traits::IEmbeddingProvider;

pub const DEFAULT_DIMENSIONS: usize = 256;

pub struct TermHashEmbedder {
    dimensions: usize,
}

impl TermHashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for TermHashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl IEmbeddingProvider for TermHashEmbedder {
    fn embed(&self, text: &str) -> LatticeResult<Vec<f32>> {
        let mut v = vec![0.0f32; self.dimensions];
        for sym in symbols_from_text(text) {
            let h = blake3::hash(sym.symbol.as_bytes());
            let bytes = h.as_bytes();
            let mut idx_bytes = [0u8; 8];
            idx_bytes.copy_from_slice(&bytes[..8]);
            let idx = (u64::from_le_bytes(idx_bytes) % self.dimensions as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign * sym.weight as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "term-hash"
    }
}
