use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lattice_core::config::{ReactorConfig, ResolverConfig};
use lattice_core::errors::{LatticeError, LatticeResult, ValidationError};
use lattice_core::identity::{Identity, IdentityType};
use lattice_core::traits::{IEmbeddingProvider, ILatticeStorage, IResonanceScorer};
use lattice_reactor::{BatchReactor, CosineScorer};
use lattice_resolver::{lattice_anchor, LatticeResolver};
use lattice_storage::StorageEngine;

/// Maps the first word of the text to a fixed vector. `boom` sets the
/// marker dimension that [`PanickingScorer`] trips on.
struct FixtureEmbedder;

impl IEmbeddingProvider for FixtureEmbedder {
    fn embed(&self, text: &str) -> LatticeResult<Vec<f32>> {
        Ok(match text.split_whitespace().next() {
            Some("pos") => vec![1.0, 0.0, 0.0],
            Some("neg") => vec![-1.0, 0.0, 0.0],
            Some("boom") => vec![1.0, 0.0, 1.0],
            _ => vec![0.0, 1.0, 0.0],
        })
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

struct PanickingScorer;

impl IResonanceScorer for PanickingScorer {
    fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        if a[2] > 0.0 || b[2] > 0.0 {
            panic!("marker dimension hit");
        }
        CosineScorer.score(a, b)
    }
}

struct SlowScorer(Duration);

impl IResonanceScorer for SlowScorer {
    fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        thread::sleep(self.0);
        CosineScorer.score(a, b)
    }
}

fn config(chunk_size: usize, cycles: usize) -> ReactorConfig {
    ReactorConfig {
        workers: 2,
        chunk_size,
        cycles,
        chunk_timeout_ms: 5_000,
        resonance_threshold: 0.9,
        embedding_cache_capacity: 64,
    }
}

fn setup(
    scorer: Arc<dyn IResonanceScorer>,
    config: ReactorConfig,
) -> (Arc<StorageEngine>, Arc<LatticeResolver>, BatchReactor) {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let resolver = Arc::new(LatticeResolver::new(
        storage.clone(),
        ResolverConfig::default(),
    ));
    let reactor =
        BatchReactor::new(resolver.clone(), Arc::new(FixtureEmbedder), scorer, config).unwrap();
    (storage, resolver, reactor)
}

fn nodes(raws: &[&str]) -> Vec<Identity> {
    raws.iter().map(|r| Identity::node(*r).unwrap()).collect()
}

#[test]
fn opposed_pair_becomes_contradiction_relation() {
    let (storage, resolver, reactor) = setup(Arc::new(CosineScorer), config(4, 1));
    let ids = nodes(&["pos the dam holds", "neg the dam failed", "other unrelated"]);

    let report = reactor.run(&ids).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.processed, 3);
    assert_eq!(report.new_relations, 1);
    assert_eq!(report.resolutions, 1);

    let relations = storage
        .list_identities(Some(IdentityType::Relation), 10)
        .unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].raw, "contradiction");
    let mut related = relations[0].related_ids.clone();
    related.sort();
    let mut expected = vec![ids[0].id.clone(), ids[1].id.clone()];
    expected.sort();
    assert_eq!(related, expected);
    assert!((relations[0].confidence - 1.0).abs() < 1e-9);

    let anchor = lattice_anchor(&ids[0].id, &ids[1].id, resolver.domain());
    assert!(storage.fetch_form(&anchor).unwrap().is_some());
}

#[test]
fn rerun_resolves_again_without_new_relations() {
    let (storage, _, reactor) = setup(Arc::new(CosineScorer), config(4, 1));
    let ids = nodes(&["pos one", "pos two"]);

    let first = reactor.run(&ids).unwrap();
    let second = reactor.run(&ids).unwrap();

    assert_eq!(first.new_relations, 1);
    assert_eq!(second.new_relations, 0);
    assert_eq!(second.resolutions, 1);
    assert_eq!(
        storage.get_identity_count(Some(IdentityType::Relation)).unwrap(),
        1
    );
    assert_eq!(reactor.cache().misses(), 2);
    assert_eq!(reactor.cache().hits(), 2);
}

#[test]
fn panicking_chunk_is_isolated() {
    let (storage, _, reactor) = setup(Arc::new(PanickingScorer), config(2, 1));
    let ids = nodes(&["boom first", "pos second", "pos third", "pos fourth"]);

    let report = reactor.run(&ids).unwrap();

    assert_eq!(report.chunk_failures.len(), 1);
    assert_eq!(report.chunk_failures[0].chunk, 0);
    assert!(report.chunk_failures[0].reason.contains("marker dimension hit"));
    assert_eq!(report.processed, 2);
    assert_eq!(report.new_relations, 1);
    assert_eq!(storage.get_form_count(None).unwrap(), 1);
}

#[test]
fn slow_chunk_times_out_and_commits_nothing() {
    let mut cfg = config(2, 1);
    cfg.chunk_timeout_ms = 30;
    let (storage, _, reactor) = setup(Arc::new(SlowScorer(Duration::from_millis(100))), cfg);
    let ids = nodes(&["pos slow one", "pos slow two"]);

    let report = reactor.run(&ids).unwrap();

    assert_eq!(report.timed_out_chunks, 1);
    assert!(report.chunk_failures.is_empty());
    assert_eq!(report.processed, 0);
    assert_eq!(report.new_relations, 0);
    assert_eq!(storage.get_identity_count(None).unwrap(), 0);
    assert_eq!(storage.get_form_count(None).unwrap(), 0);
}

#[test]
fn rotation_pairs_neighbours_across_cycles() {
    let (_, _, reactor) = setup(Arc::new(CosineScorer), config(2, 1));
    let ids = nodes(&["pos a", "pos b", "pos c", "pos d"]);

    // cycle 0: {a,b} {c,d}; cycle 1: {b,c} {d,a}; cycle 2 repeats cycle 0
    let report = reactor.run_batch(&ids, 2, 3).unwrap();

    assert_eq!(report.cycles, 3);
    assert_eq!(report.processed, 12);
    assert_eq!(report.new_relations, 4);
    assert_eq!(report.resolutions, 6);
}

#[test]
fn chunk_size_below_two_is_rejected() {
    let (storage, _, reactor) = setup(Arc::new(CosineScorer), config(2, 1));
    let ids = nodes(&["pos a", "pos b"]);

    let err = reactor.run_batch(&ids, 1, 1).unwrap_err();
    assert!(matches!(
        err,
        LatticeError::ValidationError(ValidationError::OutOfRange { .. })
    ));
    assert_eq!(storage.get_identity_count(None).unwrap(), 0);
}

#[test]
fn empty_input_and_zero_cycles_are_no_ops() {
    let (_, _, reactor) = setup(Arc::new(CosineScorer), config(2, 1));

    let empty = reactor.run_batch(&[], 2, 3).unwrap();
    assert_eq!(empty.processed, 0);
    assert_eq!(empty.cycles, 3);

    let none = reactor.run_batch(&nodes(&["pos a", "pos b"]), 2, 0).unwrap();
    assert_eq!(none.cycles, 0);
    assert_eq!(none.resolutions, 0);
}

#[test]
fn default_reactor_runs_on_real_text() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let resolver = Arc::new(LatticeResolver::new(storage.clone(), ResolverConfig::default()));
    let reactor = BatchReactor::with_defaults(resolver, config(8, 1)).unwrap();
    let ids = nodes(&[
        "the reservoir level dropped sharply",
        "the reservoir level dropped sharply",
        "migratory birds returned early",
    ]);

    let report = reactor.run(&ids).unwrap();

    // identical text shares an id, so no self-pair is reported
    assert!(report.is_clean());
    assert_eq!(report.new_relations, 0);
}
