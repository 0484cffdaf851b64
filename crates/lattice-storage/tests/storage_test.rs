use chrono::{Duration, Utc};

use lattice_core::errors::LatticeError;
use lattice_core::form::{DecayPolicy, EchoForm, FormPhase, TermRole};
use lattice_core::identity::{Identity, IdentityType};
use lattice_core::traits::ILatticeStorage;
use lattice_storage::StorageEngine;

fn engine() -> StorageEngine {
    StorageEngine::open_in_memory().unwrap()
}

fn form_at(anchor: &str, created: chrono::DateTime<Utc>) -> EchoForm {
    let mut form = EchoForm::new_at(anchor, "contradiction", created).unwrap();
    form.add_term_at("seed", TermRole::Seed, 1.0, created).unwrap();
    form.add_term_at(
        "a<>b",
        TermRole::Event {
            participants: vec!["a".into(), "b".into()],
            entropy: 0.4,
        },
        1.7,
        created + Duration::minutes(5),
    )
    .unwrap();
    form
}

// ── identities ───────────────────────────────────────────────────────────

#[test]
fn identity_roundtrip_is_lossless() {
    let storage = engine();
    let node = Identity::node("The sky is green")
        .unwrap()
        .with_tags(["claim", "color"])
        .with_weight(0.3)
        .with_meta("source", serde_json::json!({"doc": 7}));
    storage.store_identity(&node).unwrap();
    assert_eq!(storage.fetch_identity(&node.id).unwrap(), Some(node));

    let rel = Identity::relation("contradicts", vec!["x".into(), "y".into()], 0.1 + 0.2).unwrap();
    storage.store_identity(&rel).unwrap();
    let back = storage.fetch_identity(&rel.id).unwrap().unwrap();
    assert_eq!(back.confidence.to_bits(), rel.confidence.to_bits());
    assert_eq!(back, rel);
}

#[test]
fn fetch_miss_is_none() {
    let storage = engine();
    assert!(storage.fetch_identity("node_0000000000000000").unwrap().is_none());
    assert!(storage.fetch_form("nope").unwrap().is_none());
}

#[test]
fn restore_keeps_first_created_at() {
    let storage = engine();
    let mut first = Identity::node("stable content").unwrap();
    first.created_at = Utc::now() - Duration::days(10);
    first.updated_at = first.created_at;
    assert!(storage.store_identity_checked(&first).unwrap());

    let second = Identity::node("stable content").unwrap().with_weight(0.5);
    assert!(!storage.store_identity_checked(&second).unwrap());

    let back = storage.fetch_identity(&first.id).unwrap().unwrap();
    assert_eq!(back.created_at, first.created_at);
    assert_eq!(back.updated_at, second.updated_at);
    assert_eq!(back.weight, 0.5);
    assert_eq!(storage.get_identity_count(None).unwrap(), 1);
}

#[test]
fn list_and_count_filter_by_type() {
    let storage = engine();
    for i in 0..5 {
        storage.store_identity(&Identity::node(format!("node {i}")).unwrap()).unwrap();
    }
    for i in 0..3 {
        let rel = Identity::relation(format!("rel {i}"), vec!["a".into(), "b".into()], 1.0).unwrap();
        storage.store_identity(&rel).unwrap();
    }
    assert_eq!(storage.get_identity_count(None).unwrap(), 8);
    assert_eq!(storage.get_identity_count(Some(IdentityType::Node)).unwrap(), 5);
    assert_eq!(storage.get_identity_count(Some(IdentityType::Relation)).unwrap(), 3);

    let rels = storage.list_identities(Some(IdentityType::Relation), 100).unwrap();
    assert_eq!(rels.len(), 3);
    assert!(rels.iter().all(Identity::is_relation));
    assert_eq!(storage.list_identities(None, 4).unwrap().len(), 4);
}

#[test]
fn malformed_identity_is_rejected_before_write() {
    let storage = engine();
    let mut bad = Identity::node("tampered").unwrap();
    bad.id = "node_ffffffffffffffff".into();
    let err = storage.store_identity(&bad).unwrap_err();
    assert!(matches!(err, LatticeError::ValidationError(_)));

    let mut bad = Identity::node("bad weight").unwrap();
    bad.weight = f64::INFINITY;
    assert!(storage.store_identity(&bad).is_err());

    assert_eq!(storage.get_identity_count(None).unwrap(), 0);
}

// ── forms ────────────────────────────────────────────────────────────────

#[test]
fn form_roundtrip_is_lossless() {
    let storage = engine();
    let mut form = form_at("anchor-rt", Utc::now() - Duration::hours(3));
    form.set_topology("participants", serde_json::json!(["a", "b"]));
    form.set_recursive(true);
    storage.store_form(&form).unwrap();

    let back = storage.fetch_form("anchor-rt").unwrap().unwrap();
    assert_eq!(back, form);
    assert_eq!(back.trace_signature(), form.trace_signature());
    assert_eq!(
        back.intensity_sum(DecayPolicy::None).to_bits(),
        form.intensity_sum(DecayPolicy::None).to_bits()
    );
}

#[test]
fn store_form_replaces_and_update_requires_existing() {
    let storage = engine();
    let mut form = form_at("anchor-up", Utc::now());

    let err = storage.update_form(&form).unwrap_err();
    assert!(matches!(err, LatticeError::FormNotFound { ref anchor } if anchor == "anchor-up"));

    storage.store_form(&form).unwrap();
    form.add_term("extra", TermRole::Annotation, 0.5).unwrap();
    storage.update_form(&form).unwrap();
    assert_eq!(storage.fetch_form("anchor-up").unwrap().unwrap().terms().len(), 3);

    let fresh = EchoForm::new("anchor-up", "contradiction").unwrap();
    storage.store_form(&fresh).unwrap();
    assert!(storage.fetch_form("anchor-up").unwrap().unwrap().terms().is_empty());
    assert_eq!(storage.get_form_count(None).unwrap(), 1);
}

#[test]
fn list_forms_filters_by_domain() {
    let storage = engine();
    storage.store_form(&form_at("f1", Utc::now())).unwrap();
    storage.store_form(&form_at("f2", Utc::now())).unwrap();
    storage
        .store_form(&EchoForm::new("f3", "agreement").unwrap())
        .unwrap();

    assert_eq!(storage.list_forms(Some("contradiction"), 10).unwrap().len(), 2);
    assert_eq!(storage.get_form_count(Some("agreement")).unwrap(), 1);
    assert_eq!(storage.list_forms(None, 10).unwrap().len(), 3);
}

// ── maintenance ──────────────────────────────────────────────────────────

#[test]
fn prune_deletes_exactly_forms_at_or_before_cutoff() {
    let storage = engine();
    let now = Utc::now();
    for i in 0..4 {
        storage
            .store_form(&form_at(&format!("old-{i}"), now - Duration::days(30 + i)))
            .unwrap();
    }
    for i in 0..3 {
        storage
            .store_form(&form_at(&format!("new-{i}"), now - Duration::hours(i)))
            .unwrap();
    }

    let deleted = storage.prune_old_forms(now - Duration::days(7)).unwrap();
    assert_eq!(deleted, 4);
    assert_eq!(storage.get_form_count(None).unwrap(), 3);
}

#[test]
fn prune_now_deletes_every_form() {
    let storage = engine();
    for i in 0..6 {
        storage
            .store_form(&form_at(&format!("p-{i}"), Utc::now() - Duration::minutes(i)))
            .unwrap();
    }
    let total = storage.get_form_count(None).unwrap();
    assert_eq!(storage.prune_old_forms(Utc::now()).unwrap(), total);
    assert_eq!(storage.get_form_count(None).unwrap(), 0);
    assert_eq!(storage.prune_old_forms(Utc::now()).unwrap(), 0);
}

#[test]
fn decay_sweep_strictly_lowers_persisted_sum() {
    let storage = engine();
    let form = form_at("decay-me", Utc::now() - Duration::hours(1));
    storage.store_form(&form).unwrap();
    let before = form.intensity_sum(DecayPolicy::None);

    assert_eq!(storage.apply_time_decay(0.0001).unwrap(), 1);

    let after = storage.fetch_form("decay-me").unwrap().unwrap();
    assert!(after.intensity_sum(DecayPolicy::None) < before);
    assert_eq!(after.phase(), FormPhase::Compacted);
    assert_ne!(after.trace_signature(), form.trace_signature());
    assert!(after.terms().iter().all(|t| t.decayed_at.is_some()));
}

#[test]
fn decay_sweep_rejects_bad_tau_and_writes_nothing() {
    let storage = engine();
    let form = form_at("keep-me", Utc::now() - Duration::hours(1));
    storage.store_form(&form).unwrap();

    assert!(storage.apply_time_decay(0.0).is_err());
    assert!(storage.apply_time_decay(-1.0).is_err());
    assert_eq!(storage.fetch_form("keep-me").unwrap().unwrap(), form);
}

#[test]
fn preview_matches_sweep_without_writing() {
    let storage = engine();
    storage
        .store_form(&form_at("preview", Utc::now() - Duration::days(2)))
        .unwrap();

    let preview = storage.preview_time_decay(1.0).unwrap();
    assert_eq!(preview.forms, 1);
    assert!(preview.total_after < preview.total_before);
    assert_eq!(
        storage.fetch_form("preview").unwrap().unwrap().phase(),
        FormPhase::Nascent
    );
}

#[test]
fn clear_reports_rows_removed() {
    let storage = engine();
    storage.store_identity(&Identity::node("one").unwrap()).unwrap();
    storage.store_identity(&Identity::node("two").unwrap()).unwrap();
    storage.store_form(&form_at("c", Utc::now())).unwrap();

    assert_eq!(storage.clear().unwrap(), 3);
    assert_eq!(storage.get_identity_count(None).unwrap(), 0);
    assert_eq!(storage.get_form_count(None).unwrap(), 0);
}

#[test]
fn stats_and_integrity() {
    let storage = engine();
    storage.store_identity(&Identity::node("n").unwrap()).unwrap();
    storage
        .store_identity(&Identity::relation("r", vec!["a".into(), "b".into()], 1.0).unwrap())
        .unwrap();
    storage.store_form(&form_at("s", Utc::now())).unwrap();

    let stats = storage.stats().unwrap();
    assert_eq!(stats.identities, 2);
    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.relations, 1);
    assert_eq!(stats.forms, 1);
    assert_eq!(stats.terms, 2);
    assert_eq!(stats.schema_version, lattice_storage::migrations::LATEST_VERSION);
    assert!(storage.integrity_check().unwrap());
    storage.vacuum().unwrap();
}
