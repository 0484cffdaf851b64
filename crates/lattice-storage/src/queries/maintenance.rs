//! Decay sweep, decay preview, storage stats, integrity check, VACUUM.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use lattice_core::errors::{LatticeResult, ValidationError};
use lattice_core::form::DecayPolicy;

use super::form_crud;
use crate::to_storage_err;

/// What a decay sweep would do, without doing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayPreview {
    pub forms: usize,
    pub total_before: f64,
    pub total_after: f64,
}

/// Row counts and file size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub identities: usize,
    pub nodes: usize,
    pub relations: usize,
    pub forms: usize,
    pub terms: usize,
    pub legacy_nodes: usize,
    pub legacy_relations: usize,
    pub schema_version: u32,
    pub size_bytes: u64,
}

fn check_tau(tau_days: f64) -> Result<(), ValidationError> {
    ValidationError::check_range("tau_days", tau_days, f64::MIN_POSITIVE, f64::MAX)
}

/// Bake entropy-adaptive decay into every form in one transaction.
/// Returns the number of forms rewritten; on error nothing is written.
pub fn apply_time_decay(conn: &Connection, tau_days: f64, now: DateTime<Utc>) -> LatticeResult<usize> {
    check_tau(tau_days)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("decay sweep begin: {e}")))?;

    let mut forms = form_crud::all_forms(&tx)?;
    let mut before = 0.0;
    let mut after = 0.0;
    for form in &mut forms {
        let outcome = form.compact_decay(tau_days, now)?;
        before += outcome.before;
        after += outcome.after;
        form_crud::update_form(&tx, form)?;
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("decay sweep commit: {e}")))?;

    tracing::info!(
        forms = forms.len(),
        tau_days,
        total_before = before,
        total_after = after,
        "decay sweep applied"
    );
    Ok(forms.len())
}

/// Totals the sweep would produce at `now`. Read-only.
pub fn preview_time_decay(
    conn: &Connection,
    tau_days: f64,
    now: DateTime<Utc>,
) -> LatticeResult<DecayPreview> {
    check_tau(tau_days)?;
    let forms = form_crud::all_forms(conn)?;
    let mut preview = DecayPreview {
        forms: forms.len(),
        total_before: 0.0,
        total_after: 0.0,
    };
    for form in forms {
        preview.total_before += form.intensity_sum_at(DecayPolicy::None, now);
        preview.total_after +=
            form.intensity_sum_at(DecayPolicy::EntropyAdaptive { base_tau_days: tau_days }, now);
    }
    Ok(preview)
}

fn count(conn: &Connection, sql: &str) -> LatticeResult<usize> {
    let n: i64 = conn
        .query_row(sql, [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}

pub fn stats(conn: &Connection) -> LatticeResult<StorageStats> {
    let page_count: i64 = conn
        .pragma_query_value(None, "page_count", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let page_size: i64 = conn
        .pragma_query_value(None, "page_size", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(StorageStats {
        identities: count(conn, "SELECT COUNT(*) FROM identities")?,
        nodes: count(conn, "SELECT COUNT(*) FROM identities WHERE identity_type = 'node'")?,
        relations: count(
            conn,
            "SELECT COUNT(*) FROM identities WHERE identity_type = 'relation'",
        )?,
        forms: count(conn, "SELECT COUNT(*) FROM echo_forms")?,
        terms: count(
            conn,
            "SELECT COALESCE(SUM(json_array_length(terms)), 0) FROM echo_forms",
        )?,
        legacy_nodes: count(conn, "SELECT COUNT(*) FROM legacy_nodes")?,
        legacy_relations: count(conn, "SELECT COUNT(*) FROM legacy_relations")?,
        schema_version: crate::migrations::current_version(conn)?,
        size_bytes: (page_count * page_size).max(0) as u64,
    })
}

/// `PRAGMA integrity_check`. Returns true if the database is OK.
pub fn integrity_check(conn: &Connection) -> LatticeResult<bool> {
    let result: Option<String> = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(result.as_deref() == Some("ok"))
}

/// Full VACUUM. Must run outside a transaction.
pub fn vacuum(conn: &Connection) -> LatticeResult<()> {
    conn.execute_batch("VACUUM")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Truncate the WAL into the main database file.
pub fn wal_checkpoint(conn: &Connection) -> LatticeResult<()> {
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
