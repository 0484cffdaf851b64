//! Offline audit of one identity: canonical row vs legacy mirror.

use serde::{Deserialize, Serialize};

use lattice_core::identity::{Identity, IdentityType};

use crate::queries::legacy_ops::LegacyRow;

/// Placeholder value for a side that has no row.
pub const MISSING: &str = "<missing>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub canonical: String,
    pub legacy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub id: String,
    pub consistent: bool,
    pub diffs: Vec<FieldDiff>,
}

impl ConsistencyReport {
    fn from_diffs(id: &str, diffs: Vec<FieldDiff>) -> Self {
        Self {
            id: id.to_string(),
            consistent: diffs.is_empty(),
            diffs,
        }
    }

    /// Neither side has the id.
    pub(crate) fn absent(id: &str) -> Self {
        Self::from_diffs(
            id,
            vec![FieldDiff {
                field: "row".into(),
                canonical: MISSING.into(),
                legacy: MISSING.into(),
            }],
        )
    }

    /// Legacy has a row the canonical tables lack.
    pub(crate) fn compare_orphan(id: &str) -> Self {
        Self::from_diffs(
            id,
            vec![FieldDiff {
                field: "row".into(),
                canonical: MISSING.into(),
                legacy: id.to_string(),
            }],
        )
    }

    /// Compare the expected legacy encoding of `identity` with what is stored.
    pub(crate) fn compare(identity: &Identity, expected: &LegacyRow, stored: Option<&LegacyRow>) -> Self {
        let Some(stored) = stored else {
            return Self::from_diffs(
                &identity.id,
                vec![FieldDiff {
                    field: "row".into(),
                    canonical: identity.id.clone(),
                    legacy: MISSING.into(),
                }],
            );
        };

        let (payload_field, score_field) = match identity.identity_type {
            IdentityType::Node => ("symbols", "strength"),
            IdentityType::Relation => ("members", "certainty"),
        };
        let mut diffs = Vec::new();
        let mut check = |field: &str, canonical: String, legacy: String| {
            if canonical != legacy {
                diffs.push(FieldDiff {
                    field: field.to_string(),
                    canonical,
                    legacy,
                });
            }
        };
        check("content", expected.content.clone(), stored.content.clone());
        check(payload_field, expected.payload.clone(), stored.payload.clone());
        if identity.identity_type == IdentityType::Node {
            check("labels", expected.labels.clone(), stored.labels.clone());
        }
        check(
            score_field,
            format!("{:?}", expected.score),
            format!("{:?}", stored.score),
        );
        check("created", expected.created.clone(), stored.created.clone());
        check("modified", expected.modified.clone(), stored.modified.clone());

        Self::from_diffs(&identity.id, diffs)
    }
}
