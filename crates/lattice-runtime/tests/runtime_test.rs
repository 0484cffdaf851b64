use std::fs;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use lattice_core::config::{LatticeConfig, MigrationPhase};
use lattice_core::errors::LatticeError;
use lattice_core::identity::Identity;
use lattice_core::traits::ILatticeStorage;
use lattice_resolver::lattice_anchor;
use lattice_runtime::{init_tracing, LatticeRuntime};

fn pair() -> (Identity, Identity) {
    (
        Identity::node("the ferry leaves at nine").unwrap(),
        Identity::node("the ferry leaves at ten").unwrap(),
    )
}

#[test]
fn in_memory_runtime_resolves_and_counts() {
    let rt = LatticeRuntime::open_in_memory().unwrap();
    let (a, b) = pair();

    let first = rt.resolve(&a, &b).unwrap();
    let second = rt.resolve(&b, &a).unwrap();

    assert!(second > first);
    assert_eq!(rt.storage().get_form_count(None).unwrap(), 1);
    assert_eq!(rt.storage().get_identity_count(None).unwrap(), 2);
}

#[test]
fn dual_write_phase_mirrors_resolver_writes() {
    let mut config = LatticeConfig::default();
    config.storage.db_path = ":memory:".into();
    config.migration.phase = MigrationPhase::DualWrite;
    let rt = LatticeRuntime::open(config).unwrap();
    let (a, b) = pair();

    rt.resolve(&a, &b).unwrap();

    for id in [&a.id, &b.id] {
        let report = rt.storage().verify_dual_write_consistency(id).unwrap();
        assert!(report.consistent, "{:?}", report.diffs);
    }
    assert_eq!(rt.storage().get_dual_write_stats().mirrored_nodes, 2);
}

#[test]
fn config_file_drives_the_runtime() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("lattice.db");
    let cfg = dir.path().join("lattice.toml");
    fs::write(
        &cfg,
        format!(
            "[storage]\ndb_path = {:?}\nread_pool_size = 2\n\n[resolver]\ndomain = \"audit\"\n\n[reactor]\nworkers = 2\nchunk_size = 4\nresonance_threshold = 0.5\n",
            db.display().to_string()
        ),
    )
    .unwrap();

    let rt = LatticeRuntime::open_from_file(&cfg).unwrap();
    assert_eq!(rt.resolver().domain(), "audit");
    assert_eq!(rt.reactor().config().chunk_size, 4);

    let (a, b) = pair();
    rt.resolve(&a, &b).unwrap();
    drop(rt);

    let reopened = LatticeRuntime::open_from_file(&cfg).unwrap();
    let anchor = lattice_anchor(&a.id, &b.id, "audit");
    assert!(reopened.storage().fetch_form(&anchor).unwrap().is_some());
    assert!(db.exists());
}

#[test]
fn invalid_config_is_rejected_before_opening() {
    let mut config = LatticeConfig::default();
    config.storage.db_path = ":memory:".into();
    config.reactor.workers = 0;

    assert!(matches!(
        LatticeRuntime::open(config),
        Err(LatticeError::ConfigError(_))
    ));
}

#[test]
fn batch_sweep_and_prune() {
    let rt = LatticeRuntime::open_in_memory().unwrap();
    let ids: Vec<Identity> = [
        "river flooding closed the north road",
        "river flooding closed the north road today",
        "a quiet morning in the orchard",
    ]
    .iter()
    .map(|r| Identity::node(*r).unwrap())
    .collect();

    let report = rt.run_batch(&ids).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.processed, 3);

    let forms = rt.storage().get_form_count(None).unwrap();
    assert_eq!(rt.sweep().unwrap(), forms);
    assert_eq!(rt.prune_older_than_days(30).unwrap(), 0);
    assert_eq!(rt.prune_before(Utc::now() + Duration::seconds(1)).unwrap(), forms);
    assert!(rt.prune_older_than_days(-1).is_err());
}

#[test]
fn decayed_intensity_is_bounded_by_raw() {
    let rt = LatticeRuntime::open_in_memory().unwrap();
    let (a, b) = pair();
    let raw = rt.resolve(&a, &b).unwrap();

    let anchor = rt.resolver().anchor_for(&a, &b);
    let decayed = rt.decayed_intensity(&anchor).unwrap().unwrap();
    assert!(decayed <= raw + 1e-9);
    assert!(rt.decayed_intensity("cls_missing").unwrap().is_none());
}

#[test]
fn tracing_init_is_idempotent() {
    init_tracing();
    init_tracing();
    let rt = LatticeRuntime::open_in_memory().unwrap();
    rt.init_tracing();
}
