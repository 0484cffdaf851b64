use std::sync::Arc;

use lattice_core::config::ResolverConfig;
use lattice_core::errors::{LatticeResult, ValidationError};
use lattice_core::form::{DecayPolicy, EchoForm, FormPhase, TermRole};
use lattice_core::identity::Identity;
use lattice_core::traits::ILatticeStorage;

use crate::anchor::lattice_anchor;

const SEED_SYMBOL: &str = "seed";

/// Folds identity pairs into echo forms held by the store.
///
/// Holds no state of its own besides config; every call reads and writes
/// through `storage`, so it is safe to share once the store serializes writes.
pub struct LatticeResolver {
    storage: Arc<dyn ILatticeStorage>,
    config: ResolverConfig,
}

impl LatticeResolver {
    pub fn new(storage: Arc<dyn ILatticeStorage>, config: ResolverConfig) -> Self {
        Self { storage, config }
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    pub fn storage(&self) -> &Arc<dyn ILatticeStorage> {
        &self.storage
    }

    /// Anchor this resolver would use for `a` and `b`.
    pub fn anchor_for(&self, a: &Identity, b: &Identity) -> String {
        lattice_anchor(&a.id, &b.id, &self.config.domain)
    }

    /// Resolve `a` against `b` and return the form's decay-free intensity.
    ///
    /// `resolve(a, b)` and `resolve(b, a)` hit the same form.
    pub fn lattice_resolve(&self, a: &Identity, b: &Identity) -> LatticeResult<f64> {
        let anchor = self.anchor_for(a, b);
        let form = self.resolve_into(&anchor, a, b)?;
        Ok(form.intensity_sum(DecayPolicy::None))
    }

    /// Like [`lattice_resolve`](Self::lattice_resolve), under a caller-chosen
    /// anchor. Returns the persisted form.
    pub fn create_lattice_form(
        &self,
        anchor: &str,
        a: &Identity,
        b: &Identity,
    ) -> LatticeResult<EchoForm> {
        if anchor.trim().is_empty() {
            return Err(ValidationError::empty("anchor").into());
        }
        self.resolve_into(anchor, a, b)
    }

    /// Build the next state of the form in memory, then persist. Nothing is
    /// written until the identities, the new terms and the existing form's
    /// domain have all been checked.
    fn resolve_into(&self, anchor: &str, a: &Identity, b: &Identity) -> LatticeResult<EchoForm> {
        if a.id == b.id {
            return Err(ValidationError::SelfResolution { id: a.id.clone() }.into());
        }
        a.validate()?;
        b.validate()?;

        let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };
        let entropy = (a.entropy() + b.entropy()) / 2.0;
        let intensity = self.config.event_intensity * (1.0 + entropy);
        let event = TermRole::Event {
            participants: vec![first.id.clone(), second.id.clone()],
            entropy,
        };
        let symbol = format!("{}<>{}", first.id, second.id);

        let (form, existed) = match self.storage.fetch_form(anchor)? {
            Some(mut form) => {
                if form.domain() != self.config.domain {
                    return Err(ValidationError::Malformed {
                        reason: format!(
                            "anchor `{anchor}` belongs to domain `{}`, resolver domain is `{}`",
                            form.domain(),
                            self.config.domain
                        ),
                    }
                    .into());
                }
                form.add_term(symbol, event, intensity)?;
                form.set_phase(FormPhase::Active);
                (form, true)
            }
            None => {
                let mut form = EchoForm::new(anchor, self.config.domain.as_str())?;
                form.add_term(SEED_SYMBOL, TermRole::Seed, self.config.seed_intensity)?;
                form.add_term(symbol, event, intensity)?;
                form.set_recursive(a.is_relation() || b.is_relation());
                form.set_topology(
                    "participants",
                    serde_json::json!([first.id.as_str(), second.id.as_str()]),
                );
                (form, false)
            }
        };
        form.validate()?;

        self.ensure_stored(a)?;
        self.ensure_stored(b)?;
        if existed {
            self.storage.update_form(&form)?;
            tracing::debug!(
                anchor,
                terms = form.terms().len(),
                entropy,
                "lattice form re-resolved"
            );
        } else {
            self.storage.store_form(&form)?;
            tracing::info!(anchor, domain = %self.config.domain, entropy, "lattice form created");
        }
        Ok(form)
    }

    fn ensure_stored(&self, identity: &Identity) -> LatticeResult<()> {
        if self.storage.fetch_identity(&identity.id)?.is_none() {
            self.storage.store_identity(identity)?;
        }
        Ok(())
    }
}
