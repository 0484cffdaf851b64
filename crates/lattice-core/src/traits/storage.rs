use chrono::{DateTime, Utc};

use crate::errors::LatticeResult;
use crate::form::EchoForm;
use crate::identity::{Identity, IdentityType};

/// Durable CRUD + prune + decay-sweep over Identities and EchoForms.
///
/// Single-writer: implementations serialize writes internally, and callers
/// are expected to issue persistence calls from one coordinating thread.
/// Lookups return `Ok(None)` on a miss; errors always mean the backend failed
/// or the payload was rejected before writing.
pub trait ILatticeStorage: Send + Sync {
    // --- Identities ---
    fn store_identity(&self, identity: &Identity) -> LatticeResult<()>;
    fn fetch_identity(&self, id: &str) -> LatticeResult<Option<Identity>>;
    fn list_identities(
        &self,
        identity_type: Option<IdentityType>,
        limit: usize,
    ) -> LatticeResult<Vec<Identity>>;
    fn get_identity_count(&self, identity_type: Option<IdentityType>) -> LatticeResult<usize>;

    // --- Forms ---
    fn store_form(&self, form: &EchoForm) -> LatticeResult<()>;
    fn update_form(&self, form: &EchoForm) -> LatticeResult<()>;
    fn fetch_form(&self, anchor: &str) -> LatticeResult<Option<EchoForm>>;
    fn list_forms(&self, domain: Option<&str>, limit: usize) -> LatticeResult<Vec<EchoForm>>;
    fn get_form_count(&self, domain: Option<&str>) -> LatticeResult<usize>;

    // --- Maintenance ---
    /// Compaction sweep: persist entropy-adaptive decay into every form.
    /// Returns the number of forms rewritten.
    fn apply_time_decay(&self, tau_days: f64) -> LatticeResult<usize>;
    /// Delete forms created at or before `cutoff`. Returns the exact count deleted.
    fn prune_old_forms(&self, cutoff: DateTime<Utc>) -> LatticeResult<usize>;
    /// Delete every identity and form. Returns the number of rows removed.
    fn clear(&self) -> LatticeResult<usize>;
}
