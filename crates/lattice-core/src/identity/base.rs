use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::symbols::{symbols_from_text, WeightedSymbol};
use super::types::IdentityType;
use crate::constants::{MIN_RELATED_IDS, NODE_ID_PREFIX, RELATION_ID_PREFIX};
use crate::entropy;
use crate::errors::ValidationError;
use crate::hash::short_hash;

/// The unified entity. Every node and every relation in the lattice is an Identity.
///
/// Equality is structural: two values are equal only if every field matches.
/// Use [`Identity::same_entity`] to compare by id alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Deterministic hash of the canonical content / relationship set.
    pub id: String,
    pub identity_type: IdentityType,
    /// Raw content string.
    pub raw: String,
    /// Ordered weighted symbols.
    pub terms: Vec<WeightedSymbol>,
    pub tags: BTreeSet<String>,
    /// Salience in [0, 1].
    pub weight: f64,
    /// Related identity ids. At least two for relations, empty for nodes.
    pub related_ids: Vec<String>,
    /// Confidence of the relationship in [0, 1]. Always 1.0 for nodes.
    pub confidence: f64,
    /// Open extension map.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Build a node identity from raw content. Terms are tokenized from the content.
    pub fn node(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::empty("raw"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Self::derive_id(IdentityType::Node, &raw, &[]),
            identity_type: IdentityType::Node,
            terms: symbols_from_text(&raw),
            raw,
            tags: BTreeSet::new(),
            weight: 1.0,
            related_ids: Vec::new(),
            confidence: 1.0,
            meta: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Build a relation identity over `related_ids` with the given confidence.
    pub fn relation(
        raw: impl Into<String>,
        related_ids: Vec<String>,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if related_ids.len() < MIN_RELATED_IDS {
            return Err(ValidationError::TooFewRelatedIds {
                min: MIN_RELATED_IDS,
                actual: related_ids.len(),
            });
        }
        ValidationError::check_range("confidence", confidence, 0.0, 1.0)?;
        let now = Utc::now();
        Ok(Self {
            id: Self::derive_id(IdentityType::Relation, &raw, &related_ids),
            identity_type: IdentityType::Relation,
            terms: symbols_from_text(&raw),
            raw,
            tags: BTreeSet::new(),
            weight: 1.0,
            related_ids,
            confidence,
            meta: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Deterministic id for `(identity_type, raw, related_ids)`.
    ///
    /// The relationship set is hashed in sorted order, so the order callers
    /// list related ids in does not change the id.
    pub fn derive_id(identity_type: IdentityType, raw: &str, related_ids: &[String]) -> String {
        match identity_type {
            IdentityType::Node => {
                let h = short_hash([identity_type.as_str().as_bytes(), raw.as_bytes()]);
                format!("{NODE_ID_PREFIX}_{h}")
            }
            IdentityType::Relation => {
                let mut sorted: Vec<&str> = related_ids.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                let mut parts: Vec<&[u8]> = vec![identity_type.as_str().as_bytes(), raw.as_bytes()];
                parts.extend(sorted.iter().map(|s| s.as_bytes()));
                let h = short_hash(parts);
                format!("{RELATION_ID_PREFIX}_{h}")
            }
        }
    }

    pub fn with_terms(mut self, terms: Vec<WeightedSymbol>) -> Self {
        self.terms = terms;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Identity equality by id only.
    pub fn same_entity(&self, other: &Self) -> bool {
        self.id == other.id
    }

    pub fn is_relation(&self) -> bool {
        self.identity_type == IdentityType::Relation
    }

    /// Term-weight entropy, plus the relationship term for relations.
    pub fn entropy(&self) -> f64 {
        let weights: Vec<f64> = self.terms.iter().map(|t| t.weight).collect();
        let mut h = entropy::shannon_entropy(&weights);
        if self.is_relation() {
            h += entropy::relationship_entropy(self.related_ids.len(), self.confidence);
        }
        h
    }

    /// Decay constant for this identity given a base, scaled by its entropy.
    pub fn effective_tau(&self, base_tau: f64) -> f64 {
        entropy::adaptive_tau(base_tau, self.entropy())
    }

    /// Mark the identity as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Full structural validation. Run by the store before any write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::empty("id"));
        }
        if self.raw.trim().is_empty() && !self.is_relation() {
            return Err(ValidationError::empty("raw"));
        }
        let derived = Self::derive_id(self.identity_type, &self.raw, &self.related_ids);
        if derived != self.id {
            return Err(ValidationError::IdMismatch {
                stored: self.id.clone(),
                derived,
            });
        }
        ValidationError::check_range("weight", self.weight, 0.0, 1.0)?;
        ValidationError::check_range("confidence", self.confidence, 0.0, 1.0)?;
        for term in &self.terms {
            term.validate()?;
        }
        match self.identity_type {
            IdentityType::Relation if self.related_ids.len() < MIN_RELATED_IDS => {
                return Err(ValidationError::TooFewRelatedIds {
                    min: MIN_RELATED_IDS,
                    actual: self.related_ids.len(),
                });
            }
            IdentityType::Node if !self.related_ids.is_empty() => {
                return Err(ValidationError::Malformed {
                    reason: "node identities carry no related ids".to_string(),
                });
            }
            _ => {}
        }
        if self.related_ids.iter().any(String::is_empty) {
            return Err(ValidationError::empty("related_ids"));
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::Malformed {
                reason: "updated_at precedes created_at".to_string(),
            });
        }
        Ok(())
    }
}
