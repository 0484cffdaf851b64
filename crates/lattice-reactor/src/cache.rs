//! Coordinator-side embedding cache using moka.
//!
//! Keys are blake3 hashes of provider name + text. Only the coordinator
//! thread fills it; workers receive vectors inside their jobs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use lattice_core::errors::LatticeResult;
use lattice_core::traits::IEmbeddingProvider;

pub struct EmbeddingCache {
    cache: Cache<String, Arc<Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn key(provider: &dyn IEmbeddingProvider, text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(provider.name().as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Cached embedding of `text`, computing and inserting it on a miss.
    pub fn get_or_embed(
        &self,
        provider: &dyn IEmbeddingProvider,
        text: &str,
    ) -> LatticeResult<Arc<Vec<f32>>> {
        let key = Self::key(provider, text);
        if let Some(v) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(v);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let v = Arc::new(provider.embed(text)?);
        self.cache.insert(key, Arc::clone(&v));
        Ok(v)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::TermHashEmbedder;

    #[test]
    fn second_lookup_hits() {
        let cache = EmbeddingCache::new(16);
        let e = TermHashEmbedder::new(8);
        let a = cache.get_or_embed(&e, "alpha beta").unwrap();
        let b = cache.get_or_embed(&e, "alpha beta").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }
}
