use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use lattice_core::config::MigrationPhase;
use lattice_core::errors::{LatticeResult, MirrorError};
use lattice_core::form::EchoForm;
use lattice_core::identity::{Identity, IdentityType};
use lattice_core::traits::ILatticeStorage;

use super::consistency::ConsistencyReport;
use super::stats::{Counters, DualWriteStats};
use crate::engine::StorageEngine;
use crate::queries::{identity_crud, legacy_ops};
use crate::to_storage_err;

/// Canonical store plus a best-effort legacy mirror.
///
/// Implements [`ILatticeStorage`] so callers cannot tell it from the plain
/// engine. Identity writes land in the canonical tables first and their
/// errors surface; while the phase is `DualWrite` each write is then copied
/// into the legacy tables in a separate transaction, and a failed copy is
/// only logged and counted.
pub struct DualWriteStorage {
    engine: Arc<StorageEngine>,
    phase: AtomicU8,
    counters: Counters,
}

impl DualWriteStorage {
    pub fn new(engine: Arc<StorageEngine>, phase: MigrationPhase) -> Self {
        Self {
            engine,
            phase: AtomicU8::new(phase.as_u8()),
            counters: Counters::default(),
        }
    }

    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    pub fn phase(&self) -> MigrationPhase {
        MigrationPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Move the phase forward. Backward or same-phase moves are rejected.
    pub fn advance_phase(&self, next: MigrationPhase) -> Result<(), MirrorError> {
        let mut current = self.phase.load(Ordering::Acquire);
        loop {
            let from = MigrationPhase::from_u8(current);
            if !from.can_advance_to(next) {
                return Err(MirrorError::InvalidTransition {
                    from: from.to_string(),
                    to: next.to_string(),
                });
            }
            match self.phase.compare_exchange(
                current,
                next.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::info!(from = %from, to = %next, "migration phase advanced");
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Store an identity and report whether the canonical row was new.
    pub fn store_identity_checked(&self, identity: &Identity) -> LatticeResult<bool> {
        let created = self.engine.store_identity_checked(identity)?;
        self.counters.record_canonical();
        if self.phase().mirrors() {
            self.mirror(identity);
        }
        Ok(created)
    }

    /// Best-effort copy of the canonical row into the legacy tables. Never
    /// fails the caller.
    fn mirror(&self, identity: &Identity) {
        let result = self.engine.with_writer(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_storage_err(format!("mirror begin: {e}")))?;
            let canonical = identity_crud::get_identity(&tx, &identity.id)?.ok_or_else(|| {
                to_storage_err(format!("canonical row {} missing at mirror time", identity.id))
            })?;
            legacy_ops::mirror_identity(&tx, &canonical)?;
            tx.commit()
                .map_err(|e| to_storage_err(format!("mirror commit: {e}")))
        });
        match result {
            Ok(()) => self.counters.record_mirrored(identity.identity_type),
            Err(e) => {
                self.counters.record_failure();
                let err = MirrorError::WriteFailed {
                    id: identity.id.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(id = %identity.id, error = %err, "legacy mirror write failed");
            }
        }
    }

    /// Compare the canonical row for `id` with its legacy mirror.
    pub fn verify_dual_write_consistency(&self, id: &str) -> LatticeResult<ConsistencyReport> {
        let Some(identity) = self.engine.fetch_identity(id)? else {
            let in_legacy = self.engine.with_reader(|conn| {
                Ok(legacy_ops::legacy_exists(conn, IdentityType::Node, id)?
                    || legacy_ops::legacy_exists(conn, IdentityType::Relation, id)?)
            })?;
            return Ok(if in_legacy {
                ConsistencyReport::compare_orphan(id)
            } else {
                ConsistencyReport::absent(id)
            });
        };

        let expected = legacy_ops::legacy_view(&identity)?;
        let stored = self
            .engine
            .with_reader(|conn| legacy_ops::get_legacy(conn, identity.identity_type, id))
            .map_err(|e| MirrorError::ReadFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let report = ConsistencyReport::compare(&identity, &expected, stored.as_ref());
        if !report.consistent {
            tracing::warn!(id, diffs = report.diffs.len(), "dual-write inconsistency");
        }
        Ok(report)
    }

    pub fn get_dual_write_stats(&self) -> DualWriteStats {
        self.counters.snapshot(self.phase())
    }

    /// Mirror canonical identities that have no legacy row yet, `batch_size`
    /// per transaction. Returns the number mirrored. A no-op once the legacy
    /// schema is retired.
    pub fn backfill_legacy(&self, batch_size: usize) -> LatticeResult<usize> {
        if self.phase() == MigrationPhase::LegacyRetired {
            tracing::warn!("backfill skipped: legacy schema retired");
            return Ok(0);
        }
        let batch_size = batch_size.clamp(1, lattice_core::constants::MAX_BULK_BATCH_SIZE);
        let mut after: Option<String> = None;
        let mut mirrored = 0;

        loop {
            let page = self.engine.with_reader(|conn| {
                identity_crud::list_identities_after(conn, after.as_deref(), batch_size)
            })?;
            let Some(last) = page.last() else { break };
            after = Some(last.id.clone());

            mirrored += self.engine.with_writer(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_storage_err(format!("backfill begin: {e}")))?;
                let mut n = 0;
                for identity in &page {
                    if !legacy_ops::legacy_exists(&tx, identity.identity_type, &identity.id)? {
                        legacy_ops::mirror_identity(&tx, identity)?;
                        self.counters.record_mirrored(identity.identity_type);
                        n += 1;
                    }
                }
                tx.commit()
                    .map_err(|e| to_storage_err(format!("backfill commit: {e}")))?;
                Ok(n)
            })?;

            if page.len() < batch_size {
                break;
            }
        }

        tracing::info!(mirrored, "legacy backfill complete");
        Ok(mirrored)
    }
}

impl ILatticeStorage for DualWriteStorage {
    fn store_identity(&self, identity: &Identity) -> LatticeResult<()> {
        self.store_identity_checked(identity).map(|_| ())
    }

    fn fetch_identity(&self, id: &str) -> LatticeResult<Option<Identity>> {
        self.engine.fetch_identity(id)
    }

    fn list_identities(
        &self,
        identity_type: Option<IdentityType>,
        limit: usize,
    ) -> LatticeResult<Vec<Identity>> {
        self.engine.list_identities(identity_type, limit)
    }

    fn get_identity_count(&self, identity_type: Option<IdentityType>) -> LatticeResult<usize> {
        self.engine.get_identity_count(identity_type)
    }

    fn store_form(&self, form: &EchoForm) -> LatticeResult<()> {
        self.engine.store_form(form)
    }

    fn update_form(&self, form: &EchoForm) -> LatticeResult<()> {
        self.engine.update_form(form)
    }

    fn fetch_form(&self, anchor: &str) -> LatticeResult<Option<EchoForm>> {
        self.engine.fetch_form(anchor)
    }

    fn list_forms(&self, domain: Option<&str>, limit: usize) -> LatticeResult<Vec<EchoForm>> {
        self.engine.list_forms(domain, limit)
    }

    fn get_form_count(&self, domain: Option<&str>) -> LatticeResult<usize> {
        self.engine.get_form_count(domain)
    }

    fn apply_time_decay(&self, tau_days: f64) -> LatticeResult<usize> {
        self.engine.apply_time_decay(tau_days)
    }

    fn prune_old_forms(&self, cutoff: DateTime<Utc>) -> LatticeResult<usize> {
        self.engine.prune_old_forms(cutoff)
    }

    /// Clears the canonical tables, then the legacy mirror. Returns the
    /// canonical count.
    fn clear(&self) -> LatticeResult<usize> {
        let removed = self.engine.clear()?;
        if let Err(e) = self.engine.with_writer(legacy_ops::clear_legacy) {
            self.counters.record_failure();
            tracing::warn!(error = %e, "legacy clear failed");
        }
        Ok(removed)
    }
}
