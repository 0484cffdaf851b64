//! EchoForm: the append-only, entropy-weighted, time-decaying record of
//! repeated resolutions between a pair or group of identities.
//!
//! Modelled as an event-sourced aggregate: `terms` is the ordered append
//! buffer, [`FormProjection`] the materialized view, and `trace_signature`
//! a hash chain advanced on every mutation.

pub mod projection;
pub mod term;
pub mod trace;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use projection::FormProjection;
pub use term::{RawTerm, Term, TermRole};

use crate::constants::GENESIS_TRACE;
use crate::entropy;
use crate::errors::{LatticeResult, ValidationError};
use crate::hash::is_short_hash;
use crate::time::{age_days, to_db_string};

/// Lifecycle tag of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    /// Created, never re-resolved.
    Nascent,
    /// Resolved more than once.
    Active,
    /// Rewritten by a decay sweep.
    Compacted,
}

impl FormPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nascent => "nascent",
            Self::Active => "active",
            Self::Compacted => "compacted",
        }
    }
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormPhase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nascent" => Ok(Self::Nascent),
            "active" => Ok(Self::Active),
            "compacted" => Ok(Self::Compacted),
            other => Err(ValidationError::Malformed {
                reason: format!("unknown form phase `{other}`"),
            }),
        }
    }
}

/// How [`EchoForm::intensity_sum`] treats term age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DecayPolicy {
    /// Raw intensities.
    None,
    /// `exp(-age / tau)` with a fixed time constant in days.
    Fixed { tau_days: f64 },
    /// `exp(-age / adaptive_tau(base, entropy()))`: the form's own
    /// information content sets its forgetting rate.
    EntropyAdaptive { base_tau_days: f64 },
}

/// Totals before and after a compaction sweep of one form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayOutcome {
    pub before: f64,
    pub after: f64,
}

/// The aggregate. Fields are private so the term log can only grow through
/// [`EchoForm::append`] and only be rewritten by [`EchoForm::compact_decay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatForm", into = "FlatForm")]
pub struct EchoForm {
    anchor: String,
    domain: String,
    phase: FormPhase,
    terms: Vec<Term>,
    topology: BTreeMap<String, serde_json::Value>,
    trace_signature: String,
    recursive: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    projection: FormProjection,
}

impl EchoForm {
    /// An empty form created now.
    pub fn new(anchor: impl Into<String>, domain: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new_at(anchor, domain, Utc::now())
    }

    /// An empty form with an explicit creation time.
    pub fn new_at(
        anchor: impl Into<String>,
        domain: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let form = Self {
            anchor: anchor.into(),
            domain: domain.into(),
            phase: FormPhase::Nascent,
            terms: Vec::new(),
            topology: BTreeMap::new(),
            trace_signature: GENESIS_TRACE.to_string(),
            recursive: false,
            created_at,
            updated_at: created_at,
            projection: FormProjection::default(),
        };
        form.validate()?;
        Ok(form)
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn topology(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.topology
    }

    pub fn trace_signature(&self) -> &str {
        &self.trace_signature
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn projection(&self) -> &FormProjection {
        &self.projection
    }

    // --- Mutations (each advances the trace) ---

    /// Append a validated term.
    pub fn append(&mut self, term: Term) -> Result<&Term, ValidationError> {
        term.validate()?;
        self.projection.apply(&term);
        self.terms.push(term);
        self.mark_mutated();
        Ok(&self.terms[self.terms.len() - 1])
    }

    /// Append a term stamped with the current time.
    pub fn add_term(
        &mut self,
        symbol: impl Into<String>,
        role: TermRole,
        intensity: f64,
    ) -> Result<&Term, ValidationError> {
        self.append(Term::new(symbol, role, intensity)?)
    }

    /// Append a term with an explicit timestamp.
    pub fn add_term_at(
        &mut self,
        symbol: impl Into<String>,
        role: TermRole,
        intensity: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<&Term, ValidationError> {
        self.append(Term::new_at(symbol, role, intensity, timestamp)?)
    }

    pub fn set_phase(&mut self, phase: FormPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.mark_mutated();
        }
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        if self.recursive != recursive {
            self.recursive = recursive;
            self.mark_mutated();
        }
    }

    pub fn set_topology(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.topology.insert(key.into(), value);
        self.mark_mutated();
    }

    /// Bake entropy-adaptive decay into every term's intensity as of `now`
    /// and stamp `decayed_at`, so later read-time decay continues from this
    /// point instead of counting the same age twice.
    pub fn compact_decay(
        &mut self,
        base_tau_days: f64,
        now: DateTime<Utc>,
    ) -> Result<DecayOutcome, ValidationError> {
        ValidationError::check_range("tau_days", base_tau_days, f64::MIN_POSITIVE, f64::MAX)?;
        let before = self.intensity_sum(DecayPolicy::None);
        let tau = entropy::adaptive_tau(base_tau_days, self.entropy());
        for term in &mut self.terms {
            let reference = term.decay_reference();
            term.intensity *= entropy::fixed_decay(age_days(reference, now), tau);
            term.decayed_at = Some(reference.max(now));
        }
        self.projection = FormProjection::rebuild(&self.terms);
        self.phase = FormPhase::Compacted;
        self.mark_mutated();
        Ok(DecayOutcome {
            before,
            after: self.intensity_sum(DecayPolicy::None),
        })
    }

    fn mark_mutated(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
        self.trace_signature = self.compute_trace(&self.trace_signature);
    }

    // --- Pure queries ---

    /// Entropy over term intensities.
    pub fn entropy(&self) -> f64 {
        entropy::term_entropy(self.terms.iter().map(|t| t.intensity))
    }

    /// Aggregate intensity as of now. Never mutates.
    pub fn intensity_sum(&self, policy: DecayPolicy) -> f64 {
        self.intensity_sum_at(policy, Utc::now())
    }

    /// Aggregate intensity as of `now`. Never mutates.
    pub fn intensity_sum_at(&self, policy: DecayPolicy, now: DateTime<Utc>) -> f64 {
        let tau = match policy {
            DecayPolicy::None => return self.terms.iter().map(|t| t.intensity).sum(),
            DecayPolicy::Fixed { tau_days } => tau_days,
            DecayPolicy::EntropyAdaptive { base_tau_days } => {
                entropy::adaptive_tau(base_tau_days, self.entropy())
            }
        };
        self.terms
            .iter()
            .map(|t| t.intensity * entropy::fixed_decay(age_days(t.decay_reference(), now), tau))
            .sum()
    }

    /// `hash(prev_signature, serialized_state)`, 16 hex chars.
    pub fn compute_trace(&self, prev_signature: &str) -> String {
        trace::chain(prev_signature, &self.state_digest())
    }

    /// Canonical state string hashed into the trace: form identity, header
    /// flags, projection, and the latest term.
    fn state_digest(&self) -> String {
        let mut s = format!(
            "{}|{}|{}|{}|{}|{:016x}|{}",
            self.anchor,
            self.domain,
            self.phase,
            self.recursive,
            self.projection.term_count,
            self.projection.raw_total.to_bits(),
            self.topology.len(),
        );
        if let Some(last) = self.terms.last() {
            s.push_str(&format!(
                "|{}|{}|{:016x}|{}",
                last.symbol,
                last.role.kind(),
                last.intensity.to_bits(),
                to_db_string(&last.timestamp),
            ));
        }
        s
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.anchor.trim().is_empty() {
            return Err(ValidationError::empty("anchor"));
        }
        if self.domain.trim().is_empty() {
            return Err(ValidationError::empty("domain"));
        }
        if !is_short_hash(&self.trace_signature) {
            return Err(ValidationError::Malformed {
                reason: format!("trace signature `{}` is not 16 hex chars", self.trace_signature),
            });
        }
        for term in &self.terms {
            term.validate()?;
        }
        Ok(())
    }

    // --- Canonical serialization ---

    /// Canonical JSON blob.
    pub fn flatten(&self) -> LatticeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild from a [`flatten`](Self::flatten) blob. Every field, including
    /// `trace_signature` and `created_at`, is taken from the blob as-is.
    pub fn reinflate(blob: &str) -> LatticeResult<Self> {
        Ok(serde_json::from_str(blob)?)
    }

    /// Assemble from stored parts (see [`FlatForm`]).
    pub fn from_flat(flat: FlatForm) -> Result<Self, ValidationError> {
        Self::try_from(flat)
    }

    pub fn to_flat(&self) -> FlatForm {
        FlatForm::from(self.clone())
    }
}

/// Plain serializable shape of a form: the storage row and the flatten blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatForm {
    pub anchor: String,
    pub domain: String,
    pub phase: FormPhase,
    #[serde(default)]
    pub terms: Vec<RawTerm>,
    #[serde(default)]
    pub topology: BTreeMap<String, serde_json::Value>,
    pub trace_signature: String,
    #[serde(default)]
    pub recursive: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<FlatForm> for EchoForm {
    type Error = ValidationError;

    fn try_from(flat: FlatForm) -> Result<Self, Self::Error> {
        let created_at = flat.created_at;
        let terms = flat
            .terms
            .into_iter()
            .map(|t| t.resolve(created_at))
            .collect::<Result<Vec<_>, _>>()?;
        let form = Self {
            anchor: flat.anchor,
            domain: flat.domain,
            phase: flat.phase,
            projection: FormProjection::rebuild(&terms),
            terms,
            topology: flat.topology,
            trace_signature: flat.trace_signature,
            recursive: flat.recursive,
            created_at,
            updated_at: flat.updated_at.unwrap_or(created_at),
        };
        form.validate()?;
        Ok(form)
    }
}

impl From<EchoForm> for FlatForm {
    fn from(form: EchoForm) -> Self {
        Self {
            anchor: form.anchor,
            domain: form.domain,
            phase: form.phase,
            terms: form.terms.into_iter().map(RawTerm::from).collect(),
            topology: form.topology,
            trace_signature: form.trace_signature,
            recursive: form.recursive,
            created_at: form.created_at,
            updated_at: Some(form.updated_at),
        }
    }
}
