//! StorageEngine: owns the ConnectionPool, runs migrations at open, and
//! implements [`ILatticeStorage`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use lattice_core::config::StorageConfig;
use lattice_core::errors::LatticeResult;
use lattice_core::form::EchoForm;
use lattice_core::identity::{Identity, IdentityType};
use lattice_core::traits::ILatticeStorage;

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::maintenance::{DecayPreview, StorageStats};
use crate::queries::{form_crud, identity_crud, maintenance};

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a file-backed engine with `read_pool_size` readers.
    pub fn open(path: &Path, read_pool_size: usize) -> LatticeResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open(path, read_pool_size)?,
        };
        engine
            .pool
            .writer
            .with_conn_sync(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        tracing::info!(path = %path.display(), read_pool_size, "storage engine opened");
        Ok(engine)
    }

    /// Open an in-memory engine. Reads are routed through the writer.
    pub fn open_in_memory() -> LatticeResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open_in_memory()?,
        };
        engine
            .pool
            .writer
            .with_conn_sync(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        Ok(engine)
    }

    /// Open per `[storage]` config; `db_path = ":memory:"` selects in-memory mode.
    pub fn open_with_config(config: &StorageConfig) -> LatticeResult<Self> {
        if config.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(&config.db_path), config.read_pool_size)
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.pool.db_path.as_ref()
    }

    /// Run a write closure on the serialized writer.
    pub fn with_writer<F, T>(&self, f: F) -> LatticeResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> LatticeResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }

    /// Run a read-only closure on a pooled reader, or on the writer for
    /// in-memory databases.
    pub fn with_reader<F, T>(&self, f: F) -> LatticeResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> LatticeResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn_sync(f),
        }
    }

    /// Store an identity and report whether it was new.
    pub fn store_identity_checked(&self, identity: &Identity) -> LatticeResult<bool> {
        identity.validate()?;
        let created = self.with_writer(|conn| identity_crud::upsert_identity(conn, identity))?;
        tracing::debug!(id = %identity.id, created, "identity stored");
        Ok(created)
    }

    /// Totals the decay sweep would produce now, without writing.
    pub fn preview_time_decay(&self, tau_days: f64) -> LatticeResult<DecayPreview> {
        self.with_reader(|conn| maintenance::preview_time_decay(conn, tau_days, Utc::now()))
    }

    pub fn stats(&self) -> LatticeResult<StorageStats> {
        self.with_reader(maintenance::stats)
    }

    pub fn integrity_check(&self) -> LatticeResult<bool> {
        self.with_reader(maintenance::integrity_check)
    }

    pub fn vacuum(&self) -> LatticeResult<()> {
        self.with_writer(|conn| {
            if self.pool.db_path.is_some() {
                maintenance::wal_checkpoint(conn)?;
            }
            maintenance::vacuum(conn)
        })
    }

    pub fn schema_version(&self) -> LatticeResult<u32> {
        self.with_writer(migrations::current_version)
    }
}

impl ILatticeStorage for StorageEngine {
    fn store_identity(&self, identity: &Identity) -> LatticeResult<()> {
        self.store_identity_checked(identity).map(|_| ())
    }

    fn fetch_identity(&self, id: &str) -> LatticeResult<Option<Identity>> {
        self.with_reader(|conn| identity_crud::get_identity(conn, id))
    }

    fn list_identities(
        &self,
        identity_type: Option<IdentityType>,
        limit: usize,
    ) -> LatticeResult<Vec<Identity>> {
        self.with_reader(|conn| identity_crud::list_identities(conn, identity_type, limit))
    }

    fn get_identity_count(&self, identity_type: Option<IdentityType>) -> LatticeResult<usize> {
        self.with_reader(|conn| identity_crud::count_identities(conn, identity_type))
    }

    fn store_form(&self, form: &EchoForm) -> LatticeResult<()> {
        form.validate()?;
        self.with_writer(|conn| form_crud::upsert_form(conn, form))?;
        tracing::debug!(anchor = form.anchor(), terms = form.terms().len(), "form stored");
        Ok(())
    }

    fn update_form(&self, form: &EchoForm) -> LatticeResult<()> {
        form.validate()?;
        self.with_writer(|conn| form_crud::update_form(conn, form))?;
        tracing::debug!(anchor = form.anchor(), terms = form.terms().len(), "form updated");
        Ok(())
    }

    fn fetch_form(&self, anchor: &str) -> LatticeResult<Option<EchoForm>> {
        self.with_reader(|conn| form_crud::get_form(conn, anchor))
    }

    fn list_forms(&self, domain: Option<&str>, limit: usize) -> LatticeResult<Vec<EchoForm>> {
        self.with_reader(|conn| form_crud::list_forms(conn, domain, limit))
    }

    fn get_form_count(&self, domain: Option<&str>) -> LatticeResult<usize> {
        self.with_reader(|conn| form_crud::count_forms(conn, domain))
    }

    fn apply_time_decay(&self, tau_days: f64) -> LatticeResult<usize> {
        self.with_writer(|conn| maintenance::apply_time_decay(conn, tau_days, Utc::now()))
    }

    fn prune_old_forms(&self, cutoff: DateTime<Utc>) -> LatticeResult<usize> {
        let deleted = self.with_writer(|conn| form_crud::prune_forms_before(conn, cutoff))?;
        tracing::info!(deleted, cutoff = %cutoff, "pruned old forms");
        Ok(deleted)
    }

    fn clear(&self) -> LatticeResult<usize> {
        let removed = self.with_writer(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| crate::to_storage_err(format!("clear begin: {e}")))?;
            let n = identity_crud::delete_all_identities(&tx)? + form_crud::delete_all_forms(&tx)?;
            tx.commit()
                .map_err(|e| crate::to_storage_err(format!("clear commit: {e}")))?;
            Ok(n)
        })?;
        tracing::info!(removed, "storage cleared");
        Ok(removed)
    }
}
