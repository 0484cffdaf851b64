//! LatticeRuntime: owns the store, resolver and reactor for one database.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use lattice_core::config::LatticeConfig;
use lattice_core::errors::{LatticeResult, ValidationError};
use lattice_core::form::DecayPolicy;
use lattice_core::identity::Identity;
use lattice_core::traits::ILatticeStorage;
use lattice_reactor::{BatchReactor, BatchReport};
use lattice_resolver::LatticeResolver;
use lattice_storage::{DualWriteStorage, StorageEngine};

use crate::tracing_setup;

/// Everything one lattice database needs, wired together.
///
/// The resolver and reactor write through [`DualWriteStorage`], so the
/// configured migration phase applies to every write path.
pub struct LatticeRuntime {
    engine: Arc<StorageEngine>,
    storage: Arc<DualWriteStorage>,
    resolver: Arc<LatticeResolver>,
    reactor: BatchReactor,
    config: LatticeConfig,
}

impl LatticeRuntime {
    pub fn open(config: LatticeConfig) -> LatticeResult<Self> {
        config.validate()?;

        let engine = Arc::new(StorageEngine::open_with_config(&config.storage)?);
        let storage = Arc::new(DualWriteStorage::new(
            Arc::clone(&engine),
            config.migration.phase,
        ));
        let resolver = Arc::new(LatticeResolver::new(
            storage.clone(),
            config.resolver.clone(),
        ));
        let reactor = BatchReactor::with_defaults(Arc::clone(&resolver), config.reactor.clone())?;

        tracing::info!(
            db_path = %config.storage.db_path,
            phase = %config.migration.phase,
            domain = %config.resolver.domain,
            workers = config.reactor.workers,
            "lattice runtime opened"
        );
        Ok(Self {
            engine,
            storage,
            resolver,
            reactor,
            config,
        })
    }

    /// Default configuration over an in-memory database.
    pub fn open_in_memory() -> LatticeResult<Self> {
        let mut config = LatticeConfig::default();
        config.storage.db_path = ":memory:".to_string();
        Self::open(config)
    }

    pub fn open_from_file(path: &Path) -> LatticeResult<Self> {
        Self::open(LatticeConfig::from_file(path)?)
    }

    /// Install JSON tracing with this runtime's configured default level.
    pub fn init_tracing(&self) {
        tracing_setup::init_tracing_with_default(&self.config.observability.log_level);
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    pub fn storage(&self) -> &Arc<DualWriteStorage> {
        &self.storage
    }

    pub fn resolver(&self) -> &Arc<LatticeResolver> {
        &self.resolver
    }

    pub fn reactor(&self) -> &BatchReactor {
        &self.reactor
    }

    pub fn resolve(&self, a: &Identity, b: &Identity) -> LatticeResult<f64> {
        let _span = crate::resolve_span!(a.id, b.id).entered();
        self.resolver.lattice_resolve(a, b)
    }

    /// Run the reactor with the configured chunk size and cycles.
    pub fn run_batch(&self, identities: &[Identity]) -> LatticeResult<BatchReport> {
        let _span = crate::batch_span!(identities.len()).entered();
        self.reactor.run(identities)
    }

    /// Current intensity of a form under entropy-adaptive decay.
    /// `None` when the anchor has no form.
    pub fn decayed_intensity(&self, anchor: &str) -> LatticeResult<Option<f64>> {
        let policy = DecayPolicy::EntropyAdaptive {
            base_tau_days: self.config.decay.base_tau_days,
        };
        Ok(self
            .storage
            .fetch_form(anchor)?
            .map(|form| form.intensity_sum(policy)))
    }

    /// Compact every form with the configured sweep tau.
    pub fn sweep(&self) -> LatticeResult<usize> {
        let _span = crate::maintenance_span!("sweep").entered();
        self.storage.apply_time_decay(self.config.decay.sweep_tau_days)
    }

    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> LatticeResult<usize> {
        let _span = crate::maintenance_span!("prune").entered();
        self.storage.prune_old_forms(cutoff)
    }

    /// Prune forms created more than `days` ago.
    pub fn prune_older_than_days(&self, days: i64) -> LatticeResult<usize> {
        let cutoff = Duration::try_days(days)
            .filter(|_| days >= 0)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "days".into(),
                value: days as f64,
                min: 0.0,
                max: f64::MAX,
            })?;
        self.prune_before(cutoff)
    }
}
