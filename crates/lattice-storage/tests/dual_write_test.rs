use std::sync::Arc;

use chrono::{Duration, Utc};

use lattice_core::config::MigrationPhase;
use lattice_core::errors::MirrorError;
use lattice_core::identity::Identity;
use lattice_core::traits::ILatticeStorage;
use lattice_storage::{DualWriteStorage, StorageEngine};

fn dual(phase: MigrationPhase) -> DualWriteStorage {
    DualWriteStorage::new(Arc::new(StorageEngine::open_in_memory().unwrap()), phase)
}

fn identities(n: usize) -> Vec<Identity> {
    (0..n)
        .map(|i| {
            if i % 3 == 2 {
                Identity::relation(
                    format!("relation {i}"),
                    vec![format!("node-{i}"), format!("node-{}", i + 1)],
                    0.75,
                )
                .unwrap()
            } else {
                Identity::node(format!("statement number {i}"))
                    .unwrap()
                    .with_tags(["t"])
            }
        })
        .collect()
}

#[test]
fn ten_identities_verify_consistent() {
    let storage = dual(MigrationPhase::DualWrite);
    let items = identities(10);
    for identity in &items {
        storage.store_identity(identity).unwrap();
    }
    for identity in &items {
        let report = storage.verify_dual_write_consistency(&identity.id).unwrap();
        assert!(report.consistent, "{:?}", report.diffs);
    }

    let stats = storage.get_dual_write_stats();
    assert_eq!(stats.canonical_writes, 10);
    assert_eq!(stats.mirrored_nodes + stats.mirrored_relations, 10);
    assert_eq!(stats.mirrored_relations, 3);
    assert_eq!(stats.mirror_failures, 0);
    assert_eq!(stats.success_rate, 1.0);
}

#[test]
fn mirror_failure_never_fails_the_canonical_write() {
    let storage = dual(MigrationPhase::DualWrite);
    storage
        .engine()
        .with_writer(|conn| {
            conn.execute_batch("DROP TABLE legacy_nodes").unwrap();
            Ok(())
        })
        .unwrap();

    let node = Identity::node("survives mirror failure").unwrap();
    storage.store_identity(&node).unwrap();
    assert_eq!(storage.fetch_identity(&node.id).unwrap(), Some(node.clone()));

    let stats = storage.get_dual_write_stats();
    assert_eq!(stats.canonical_writes, 1);
    assert_eq!(stats.mirror_failures, 1);
    assert_eq!(stats.success_rate, 0.0);

    // Relations mirror into a different table and still succeed.
    let rel = Identity::relation("still mirrored", vec!["a".into(), "b".into()], 1.0).unwrap();
    storage.store_identity(&rel).unwrap();
    assert!(storage.verify_dual_write_consistency(&rel.id).unwrap().consistent);
}

#[test]
fn missing_mirror_row_is_reported() {
    let storage = dual(MigrationPhase::Off);
    let node = Identity::node("written before dual write").unwrap();
    storage.store_identity(&node).unwrap();
    assert_eq!(storage.get_dual_write_stats().mirrored_nodes, 0);

    let report = storage.verify_dual_write_consistency(&node.id).unwrap();
    assert!(!report.consistent);
    assert_eq!(report.diffs[0].field, "row");

    let report = storage.verify_dual_write_consistency("node_0123456789abcdef").unwrap();
    assert!(!report.consistent);
}

#[test]
fn restore_under_dual_write_mirrors_the_canonical_row() {
    let storage = dual(MigrationPhase::Off);
    let mut early = Identity::node("the lighthouse was decommissioned").unwrap();
    early.created_at = Utc::now() - Duration::days(3);
    early.updated_at = early.created_at;
    storage.store_identity(&early).unwrap();

    storage.advance_phase(MigrationPhase::DualWrite).unwrap();
    let again = Identity::node("the lighthouse was decommissioned").unwrap();
    storage.store_identity(&again).unwrap();

    let canonical = storage.fetch_identity(&again.id).unwrap().unwrap();
    assert_eq!(canonical.created_at, early.created_at);
    let report = storage.verify_dual_write_consistency(&again.id).unwrap();
    assert!(report.consistent, "{:?}", report.diffs);
    assert_eq!(storage.get_dual_write_stats().mirrored_nodes, 1);
}

#[test]
fn backfill_mirrors_pre_existing_identities() {
    let storage = dual(MigrationPhase::Off);
    let items = identities(25);
    for identity in &items {
        storage.store_identity(identity).unwrap();
    }
    storage.advance_phase(MigrationPhase::DualWrite).unwrap();

    assert_eq!(storage.backfill_legacy(7).unwrap(), 25);
    assert_eq!(storage.backfill_legacy(7).unwrap(), 0);
    for identity in &items {
        assert!(storage.verify_dual_write_consistency(&identity.id).unwrap().consistent);
    }
}

#[test]
fn phase_only_moves_forward() {
    let storage = dual(MigrationPhase::Off);
    storage.advance_phase(MigrationPhase::DualWrite).unwrap();
    assert!(matches!(
        storage.advance_phase(MigrationPhase::Off),
        Err(MirrorError::InvalidTransition { .. })
    ));
    storage.advance_phase(MigrationPhase::LegacyRetired).unwrap();
    assert_eq!(storage.phase(), MigrationPhase::LegacyRetired);
    assert!(storage.advance_phase(MigrationPhase::LegacyRetired).is_err());

    // Retired: writes are canonical only.
    storage.store_identity(&Identity::node("after retirement").unwrap()).unwrap();
    let stats = storage.get_dual_write_stats();
    assert_eq!(stats.canonical_writes, 1);
    assert_eq!(stats.mirrored_nodes, 0);
    assert_eq!(storage.backfill_legacy(10).unwrap(), 0);
}

#[test]
fn clear_empties_both_schemas() {
    let storage = dual(MigrationPhase::DualWrite);
    for identity in identities(4) {
        storage.store_identity(&identity).unwrap();
    }
    assert_eq!(storage.clear().unwrap(), 4);
    let stats = storage.engine().stats().unwrap();
    assert_eq!(stats.identities, 0);
    assert_eq!(stats.legacy_nodes + stats.legacy_relations, 0);
}
