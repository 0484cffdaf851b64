//! Schema migrations using PRAGMA user_version.

pub mod v001_lattice_tables;
pub mod v002_legacy_tables;

use rusqlite::Connection;

use lattice_core::errors::{LatticeResult, StorageError};

/// Latest schema version.
pub const LATEST_VERSION: u32 = 2;

const MIGRATIONS: &[(&str, u32)] = &[
    (v001_lattice_tables::MIGRATION_SQL, 1),
    (v002_legacy_tables::MIGRATION_SQL, 2),
];

/// Apply every pending migration, each in its own transaction.
/// Returns the number applied.
pub fn run_migrations(conn: &Connection) -> LatticeResult<usize> {
    let current = current_version(conn)?;
    let mut applied = 0;

    for (sql, version) in MIGRATIONS {
        if current >= *version {
            continue;
        }
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version).map_err(failed)?;
        tx.commit().map_err(failed)?;

        tracing::info!(version = version, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Current schema version.
pub fn current_version(conn: &Connection) -> LatticeResult<u32> {
    let version = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
    Ok(version)
}
