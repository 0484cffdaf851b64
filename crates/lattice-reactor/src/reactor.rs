use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lattice_core::config::ReactorConfig;
use lattice_core::errors::{LatticeResult, ValidationError, WorkerFailure};
use lattice_core::identity::Identity;
use lattice_core::traits::{IEmbeddingProvider, IResonanceScorer};
use lattice_resolver::LatticeResolver;

use crate::cache::EmbeddingCache;
use crate::chunk::{plan_chunks, ChunkJob, RelationCandidate};
use crate::embedding::TermHashEmbedder;
use crate::pool::WorkerPool;
use crate::report::{BatchReport, ChunkFailure};
use crate::scoring::CosineScorer;

/// Batch resonance scanner.
///
/// The calling thread is the coordinator: it embeds, plans chunks, and does
/// every store write. Workers only score.
pub struct BatchReactor {
    resolver: Arc<LatticeResolver>,
    embedder: Arc<dyn IEmbeddingProvider>,
    scorer: Arc<dyn IResonanceScorer>,
    cache: EmbeddingCache,
    pool: WorkerPool,
    config: ReactorConfig,
}

impl BatchReactor {
    pub fn new(
        resolver: Arc<LatticeResolver>,
        embedder: Arc<dyn IEmbeddingProvider>,
        scorer: Arc<dyn IResonanceScorer>,
        config: ReactorConfig,
    ) -> Result<Self, WorkerFailure> {
        let pool = WorkerPool::new(config.workers, Duration::from_millis(config.chunk_timeout_ms))?;
        Ok(Self {
            resolver,
            embedder,
            scorer,
            cache: EmbeddingCache::new(config.embedding_cache_capacity),
            pool,
            config,
        })
    }

    /// Reactor with the hashing embedder and cosine scorer.
    pub fn with_defaults(
        resolver: Arc<LatticeResolver>,
        config: ReactorConfig,
    ) -> Result<Self, WorkerFailure> {
        Self::new(
            resolver,
            Arc::new(TermHashEmbedder::default()),
            Arc::new(CosineScorer),
            config,
        )
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// [`run_batch`](Self::run_batch) with the configured chunk size and cycles.
    pub fn run(&self, identities: &[Identity]) -> LatticeResult<BatchReport> {
        self.run_batch(identities, self.config.chunk_size, self.config.cycles)
    }

    /// Scan `identities` for resonant pairs, `cycles` times, in chunks of
    /// `chunk_size`.
    ///
    /// Failed and timed-out chunks are recorded in the report and the batch
    /// continues. Store errors during write-back are fatal and returned.
    pub fn run_batch(
        &self,
        identities: &[Identity],
        chunk_size: usize,
        cycles: usize,
    ) -> LatticeResult<BatchReport> {
        if chunk_size < 2 {
            return Err(ValidationError::OutOfRange {
                field: "chunk_size".into(),
                value: chunk_size as f64,
                min: 2.0,
                max: f64::MAX,
            }
            .into());
        }
        for identity in identities {
            identity.validate()?;
        }

        let started = Instant::now();
        let by_id: HashMap<&str, &Identity> =
            identities.iter().map(|i| (i.id.as_str(), i)).collect();
        let embeddings = identities
            .iter()
            .map(|i| self.cache.get_or_embed(self.embedder.as_ref(), &i.raw))
            .collect::<LatticeResult<Vec<_>>>()?;

        let mut report = BatchReport::default();
        for cycle in 0..cycles {
            let jobs: Vec<ChunkJob> = plan_chunks(identities.len(), chunk_size, cycle)
                .into_iter()
                .enumerate()
                .map(|(chunk, members)| ChunkJob {
                    cycle,
                    chunk,
                    ids: members.iter().map(|&i| identities[i].id.clone()).collect(),
                    embeddings: members.iter().map(|&i| embeddings[i].as_ref().clone()).collect(),
                    threshold: self.config.resonance_threshold,
                })
                .collect();
            let chunk_count = jobs.len();

            for outcome in self.pool.dispatch(jobs, Arc::clone(&self.scorer)) {
                match outcome.result {
                    Ok(candidates) => {
                        report.processed += outcome.size;
                        for candidate in &candidates {
                            self.write_back(candidate, &by_id, &mut report)?;
                        }
                    }
                    Err(WorkerFailure::TimedOut { .. }) => {
                        tracing::warn!(cycle, chunk = outcome.chunk, "chunk timed out, results discarded");
                        report.timed_out_chunks += 1;
                    }
                    Err(failure) => {
                        tracing::warn!(cycle, chunk = outcome.chunk, error = %failure, "chunk failed");
                        report.chunk_failures.push(ChunkFailure {
                            cycle,
                            chunk: outcome.chunk,
                            reason: failure.to_string(),
                        });
                    }
                }
            }
            report.cycles += 1;
            tracing::debug!(cycle, chunks = chunk_count, "reactor cycle complete");
        }

        tracing::info!(
            identities = identities.len(),
            processed = report.processed,
            new_relations = report.new_relations,
            resolutions = report.resolutions,
            failures = report.chunk_failures.len(),
            timed_out = report.timed_out_chunks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        Ok(report)
    }

    /// Persist one candidate: its relation identity, then one resolution.
    fn write_back(
        &self,
        candidate: &RelationCandidate,
        by_id: &HashMap<&str, &Identity>,
        report: &mut BatchReport,
    ) -> LatticeResult<()> {
        let missing = |id: &str| ValidationError::Malformed {
            reason: format!("candidate references unknown identity `{id}`"),
        };
        let a = by_id
            .get(candidate.source_id.as_str())
            .ok_or_else(|| missing(&candidate.source_id))?;
        let b = by_id
            .get(candidate.target_id.as_str())
            .ok_or_else(|| missing(&candidate.target_id))?;

        let kind = if candidate.is_contradiction() {
            "contradiction"
        } else {
            "resonance"
        };
        let relation = Identity::relation(
            kind,
            vec![a.id.clone(), b.id.clone()],
            candidate.score.abs().clamp(0.0, 1.0),
        )?
        .with_meta("score", candidate.score.into());

        let storage = self.resolver.storage();
        if storage.fetch_identity(&relation.id)?.is_none() {
            report.new_relations += 1;
        }
        storage.store_identity(&relation)?;
        self.resolver.lattice_resolve(a, b)?;
        report.resolutions += 1;
        Ok(())
    }
}
