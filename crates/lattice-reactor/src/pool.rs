//! Fixed-size worker pool. Jobs go out as [`ChunkJob`]s, results come back
//! over a crossbeam channel. A panicking or slow chunk only loses itself.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use lattice_core::errors::WorkerFailure;
use lattice_core::traits::IResonanceScorer;

use crate::chunk::{ChunkJob, RelationCandidate};

/// Result of one chunk, as seen by the coordinator.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub cycle: usize,
    pub chunk: usize,
    pub size: usize,
    pub result: Result<Vec<RelationCandidate>, WorkerFailure>,
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
    timeout: Duration,
}

impl WorkerPool {
    pub fn new(workers: usize, timeout: Duration) -> Result<Self, WorkerFailure> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lattice-reactor-{i}"))
            .build()
            .map_err(|e| WorkerFailure::PoolUnavailable {
                reason: e.to_string(),
            })?;
        Ok(Self {
            pool,
            workers,
            timeout,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every job and return one outcome per job, ordered by chunk index.
    ///
    /// Each worker stops early once its own chunk has run longer than the
    /// timeout. The coordinator also stops waiting at a backstop deadline
    /// sized to the number of pool rounds, raises the cancel flag of every
    /// chunk still outstanding, and reports those as timed out. Results that
    /// arrive after that go to a dropped receiver.
    pub fn dispatch(
        &self,
        jobs: Vec<ChunkJob>,
        scorer: Arc<dyn IResonanceScorer>,
    ) -> Vec<ChunkOutcome> {
        let (tx, rx) = crossbeam_channel::bounded::<ChunkOutcome>(jobs.len().max(1));
        let mut pending: Vec<Option<(usize, usize, Arc<AtomicBool>)>> = Vec::with_capacity(jobs.len());
        let timeout = self.timeout;

        for (slot, job) in jobs.into_iter().enumerate() {
            let cancel = Arc::new(AtomicBool::new(false));
            pending.push(Some((job.cycle, job.ids.len(), Arc::clone(&cancel))));
            let tx = tx.clone();
            let scorer = Arc::clone(&scorer);
            self.pool.spawn(move || {
                let (cycle, chunk, size) = (job.cycle, job.chunk, job.ids.len());
                let result = catch_unwind(AssertUnwindSafe(|| {
                    score_chunk(&job, scorer.as_ref(), &cancel, timeout)
                }))
                .unwrap_or_else(|payload| {
                    Err(WorkerFailure::Panicked {
                        chunk,
                        message: panic_message(payload.as_ref()),
                    })
                });
                // The receiver is gone once the coordinator gave up on this batch.
                let _ = tx.send(ChunkOutcome {
                    cycle,
                    chunk: slot,
                    size,
                    result,
                });
            });
        }
        drop(tx);

        let rounds = pending.len().div_ceil(self.workers).max(1) as u32;
        let deadline = Instant::now() + timeout * (rounds + 1);
        let mut outcomes: Vec<ChunkOutcome> = Vec::with_capacity(pending.len());
        let mut outstanding = pending.len();

        while outstanding > 0 {
            let wait = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(outcome) => {
                    if let Some(slot) = pending.get_mut(outcome.chunk) {
                        if slot.take().is_some() {
                            outstanding -= 1;
                            outcomes.push(outcome);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let timeout_ms = timeout.as_millis() as u64;
        for (chunk, slot) in pending.into_iter().enumerate() {
            if let Some((cycle, size, cancel)) = slot {
                cancel.store(true, Ordering::Release);
                outcomes.push(ChunkOutcome {
                    cycle,
                    chunk,
                    size,
                    result: Err(WorkerFailure::TimedOut { chunk, timeout_ms }),
                });
            }
        }

        outcomes.sort_by_key(|o| o.chunk);
        outcomes
    }
}

/// Score every pair in `job`. All-or-nothing: a chunk that overruns or is
/// cancelled returns no candidates.
pub fn score_chunk(
    job: &ChunkJob,
    scorer: &dyn IResonanceScorer,
    cancel: &AtomicBool,
    timeout: Duration,
) -> Result<Vec<RelationCandidate>, WorkerFailure> {
    let started = Instant::now();
    let timed_out = || WorkerFailure::TimedOut {
        chunk: job.chunk,
        timeout_ms: timeout.as_millis() as u64,
    };
    if job.embeddings.len() != job.ids.len() {
        return Err(WorkerFailure::Failed {
            chunk: job.chunk,
            reason: format!(
                "{} ids but {} embeddings",
                job.ids.len(),
                job.embeddings.len()
            ),
        });
    }

    let mut out = Vec::new();
    for i in 0..job.ids.len() {
        for j in (i + 1)..job.ids.len() {
            if cancel.load(Ordering::Acquire) {
                return Err(timed_out());
            }
            if job.ids[i] == job.ids[j] {
                continue;
            }
            let score = scorer.score(&job.embeddings[i], &job.embeddings[j]);
            if started.elapsed() > timeout {
                return Err(timed_out());
            }
            if !score.is_finite() {
                return Err(WorkerFailure::Failed {
                    chunk: job.chunk,
                    reason: format!("non-finite score for {} / {}", job.ids[i], job.ids[j]),
                });
            }
            if score.abs() >= job.threshold {
                out.push(RelationCandidate {
                    source_id: job.ids[i].clone(),
                    target_id: job.ids[j].clone(),
                    score,
                });
            }
        }
    }
    Ok(out)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CosineScorer;

    fn job(embeddings: Vec<Vec<f32>>, threshold: f64) -> ChunkJob {
        ChunkJob {
            cycle: 0,
            chunk: 0,
            ids: (0..embeddings.len()).map(|i| format!("id{i}")).collect(),
            embeddings,
            threshold,
        }
    }

    #[test]
    fn reports_only_pairs_over_threshold() {
        let j = job(vec![vec![1.0, 0.0], vec![1.0, 0.1], vec![0.0, 1.0]], 0.9);
        let out = score_chunk(&j, &CosineScorer, &AtomicBool::new(false), Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].source_id.as_str(), out[0].target_id.as_str()), ("id0", "id1"));
    }

    #[test]
    fn negative_scores_count_by_magnitude() {
        let j = job(vec![vec![1.0, 0.0], vec![-1.0, 0.0]], 0.9);
        let out = score_chunk(&j, &CosineScorer, &AtomicBool::new(false), Duration::from_secs(5))
            .unwrap();
        assert!(out[0].is_contradiction());
    }

    #[test]
    fn cancelled_chunk_returns_nothing() {
        let j = job(vec![vec![1.0], vec![1.0]], 0.0);
        let err = score_chunk(&j, &CosineScorer, &AtomicBool::new(true), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, WorkerFailure::TimedOut { .. }));
    }

    #[test]
    fn mismatched_embeddings_fail() {
        let mut j = job(vec![vec![1.0], vec![1.0]], 0.0);
        j.embeddings.pop();
        assert!(matches!(
            score_chunk(&j, &CosineScorer, &AtomicBool::new(false), Duration::from_secs(5)),
            Err(WorkerFailure::Failed { .. })
        ));
    }
}
