use lattice_core::errors::ValidationError;
use lattice_core::identity::{Identity, IdentityType, WeightedSymbol};

#[test]
fn node_id_is_deterministic() {
    let a = Identity::node("water boils at 100C").unwrap();
    let b = Identity::node("water boils at 100C").unwrap();
    assert_eq!(a.id, b.id);
    assert!(a.id.starts_with("node_"));
    assert_ne!(a.id, Identity::node("water boils at 90C").unwrap().id);
}

#[test]
fn relation_id_ignores_related_id_order_but_keeps_stored_order() {
    let ab = Identity::relation("conflict", vec!["a".into(), "b".into()], 0.9).unwrap();
    let ba = Identity::relation("conflict", vec!["b".into(), "a".into()], 0.9).unwrap();
    assert_eq!(ab.id, ba.id);
    assert!(ab.id.starts_with("rel_"));
    assert_eq!(ba.related_ids, vec!["b".to_string(), "a".to_string()]);
}

#[test]
fn type_participates_in_the_id() {
    let node = Identity::derive_id(IdentityType::Node, "x", &[]);
    let rel = Identity::derive_id(IdentityType::Relation, "x", &["a".into(), "b".into()]);
    assert_ne!(node, rel);
}

#[test]
fn relation_needs_two_related_ids() {
    let err = Identity::relation("c", vec!["a".into()], 1.0).unwrap_err();
    assert_eq!(err, ValidationError::TooFewRelatedIds { min: 2, actual: 1 });
}

#[test]
fn empty_node_content_is_rejected() {
    assert!(Identity::node("   ").is_err());
}

#[test]
fn validate_catches_tampered_id_and_bad_weights() {
    let mut node = Identity::node("alpha beta").unwrap();
    node.id = "node_deadbeefdeadbeef".into();
    assert!(matches!(node.validate(), Err(ValidationError::IdMismatch { .. })));

    let node = Identity::node("alpha beta").unwrap().with_weight(1.5);
    assert!(matches!(node.validate(), Err(ValidationError::OutOfRange { .. })));

    let node = Identity::node("alpha beta")
        .unwrap()
        .with_terms(vec![WeightedSymbol::new("alpha", f64::NAN)]);
    assert!(matches!(node.validate(), Err(ValidationError::NonFinite { .. })));
}

#[test]
fn relation_entropy_includes_relationship_term() {
    let node = Identity::node("same words here").unwrap();
    let rel = Identity::relation("same words here", vec!["a".into(), "b".into()], 1.0).unwrap();
    assert!((rel.entropy() - node.entropy() - 1.0).abs() < 1e-12);
    assert!(rel.effective_tau(1.0) > node.effective_tau(1.0));
}

#[test]
fn builder_helpers_set_fields() {
    let node = Identity::node("tagged content")
        .unwrap()
        .with_tags(["b", "a", "a"])
        .with_weight(0.25)
        .with_meta("source", serde_json::json!("unit"));
    assert_eq!(node.tags.len(), 2);
    assert_eq!(node.weight, 0.25);
    assert_eq!(node.meta["source"], "unit");
    node.validate().unwrap();
}

#[test]
fn same_entity_compares_ids_only() {
    let a = Identity::node("x y").unwrap();
    let b = Identity::node("x y").unwrap().with_weight(0.1);
    assert!(a.same_entity(&b));
    assert_ne!(a, b);
}
