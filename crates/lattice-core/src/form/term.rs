use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// What a term records. Validated at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermRole {
    /// Fixed-intensity term written when a form is first created.
    Seed,
    /// One resolution of the form's identities.
    Event {
        participants: Vec<String>,
        /// Mean entropy of the participants at resolution time.
        entropy: f64,
    },
    /// Caller-written marker.
    Annotation,
    /// Forward-compatible role name.
    Custom { name: String },
}

impl TermRole {
    pub fn kind(&self) -> &str {
        match self {
            Self::Seed => "seed",
            Self::Event { .. } => "event",
            Self::Annotation => "annotation",
            Self::Custom { name } => name,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event { .. })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Event {
                participants,
                entropy,
            } => {
                if participants.is_empty() || participants.iter().any(String::is_empty) {
                    return Err(ValidationError::empty("role.participants"));
                }
                ValidationError::check_range("role.entropy", *entropy, 0.0, f64::MAX)
            }
            Self::Custom { name } if name.trim().is_empty() => {
                Err(ValidationError::empty("role.name"))
            }
            _ => Ok(()),
        }
    }
}

/// One entry in an EchoForm's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub symbol: String,
    pub role: TermRole,
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
    /// Last time a compaction sweep baked decay into `intensity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decayed_at: Option<DateTime<Utc>>,
    /// Open extension map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

impl Term {
    /// A validated term stamped with the current time.
    pub fn new(
        symbol: impl Into<String>,
        role: TermRole,
        intensity: f64,
    ) -> Result<Self, ValidationError> {
        Self::new_at(symbol, role, intensity, Utc::now())
    }

    /// A validated term with an explicit timestamp.
    pub fn new_at(
        symbol: impl Into<String>,
        role: TermRole,
        intensity: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let term = Self {
            symbol: symbol.into(),
            role,
            intensity,
            timestamp,
            decayed_at: None,
            attrs: BTreeMap::new(),
        };
        term.validate()?;
        Ok(term)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Reference point for decay: the last sweep, else the original timestamp.
    pub fn decay_reference(&self) -> DateTime<Utc> {
        self.decayed_at.unwrap_or(self.timestamp)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.is_empty() {
            return Err(ValidationError::empty("term.symbol"));
        }
        ValidationError::check_range("term.intensity", self.intensity, 0.0, f64::MAX)?;
        self.role.validate()
    }
}

/// Serialized term as found in a stored or flattened blob. Missing
/// `intensity` reads as 0, missing `timestamp` is filled in by the owning form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTerm {
    pub symbol: String,
    pub role: TermRole,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub decayed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

impl RawTerm {
    /// Resolve into a validated term. A missing timestamp becomes
    /// `fallback` (the form's creation time), never "now".
    pub fn resolve(self, fallback: DateTime<Utc>) -> Result<Term, ValidationError> {
        let term = Term {
            symbol: self.symbol,
            role: self.role,
            intensity: self.intensity,
            timestamp: self.timestamp.unwrap_or(fallback),
            decayed_at: self.decayed_at,
            attrs: self.attrs,
        };
        term.validate()?;
        Ok(term)
    }
}

impl From<Term> for RawTerm {
    fn from(t: Term) -> Self {
        Self {
            symbol: t.symbol,
            role: t.role,
            intensity: t.intensity,
            timestamp: Some(t.timestamp),
            decayed_at: t.decayed_at,
            attrs: t.attrs,
        }
    }
}
