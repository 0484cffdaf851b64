//! Insert-or-replace, update, get, list, count and prune for echo forms.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use lattice_core::constants::MAX_LIST_LIMIT;
use lattice_core::errors::{LatticeError, LatticeResult};
use lattice_core::form::{EchoForm, FlatForm, FormPhase, RawTerm};
use lattice_core::time::{from_db_string, to_db_string};

use crate::{corrupt_row, to_storage_err};

const SELECT_COLUMNS: &str =
    "anchor, domain, terms, phase, topology, trace_signature, recursive, created_at, updated_at";

/// Serialized column values for one form.
struct FormColumns {
    terms: String,
    topology: String,
    created_at: String,
    updated_at: String,
}

fn columns(form: &EchoForm) -> LatticeResult<FormColumns> {
    let flat = form.to_flat();
    Ok(FormColumns {
        terms: serde_json::to_string(&flat.terms)?,
        topology: serde_json::to_string(&flat.topology)?,
        created_at: to_db_string(&form.created_at()),
        updated_at: to_db_string(&form.updated_at()),
    })
}

/// Insert a form, replacing any existing row for the anchor.
pub fn upsert_form(conn: &Connection, form: &EchoForm) -> LatticeResult<()> {
    let c = columns(form)?;
    conn.execute(
        "INSERT OR REPLACE INTO echo_forms (
            anchor, domain, terms, phase, topology, trace_signature, recursive,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            form.anchor(),
            form.domain(),
            c.terms,
            form.phase().as_str(),
            c.topology,
            form.trace_signature(),
            form.is_recursive() as i32,
            c.created_at,
            c.updated_at,
        ],
    )
    .map_err(|e| to_storage_err(format!("store form {}: {e}", form.anchor())))?;
    Ok(())
}

/// Overwrite an existing form. Errors with `FormNotFound` if the anchor is absent.
pub fn update_form(conn: &Connection, form: &EchoForm) -> LatticeResult<()> {
    let c = columns(form)?;
    let rows = conn
        .execute(
            "UPDATE echo_forms SET
                domain = ?2, terms = ?3, phase = ?4, topology = ?5,
                trace_signature = ?6, recursive = ?7, created_at = ?8, updated_at = ?9
             WHERE anchor = ?1",
            params![
                form.anchor(),
                form.domain(),
                c.terms,
                form.phase().as_str(),
                c.topology,
                form.trace_signature(),
                form.is_recursive() as i32,
                c.created_at,
                c.updated_at,
            ],
        )
        .map_err(|e| to_storage_err(format!("update form {}: {e}", form.anchor())))?;
    if rows == 0 {
        return Err(LatticeError::FormNotFound {
            anchor: form.anchor().to_string(),
        });
    }
    Ok(())
}

/// Get a single form by anchor. `Ok(None)` on a miss.
pub fn get_form(conn: &Connection, anchor: &str) -> LatticeResult<Option<EchoForm>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM echo_forms WHERE anchor = ?1");
    let row = conn
        .query_row(&sql, params![anchor], FormRow::from_row)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(FormRow::into_form).transpose()
}

/// List forms oldest first, optionally filtered by domain.
pub fn list_forms(
    conn: &Connection,
    domain: Option<&str>,
    limit: usize,
) -> LatticeResult<Vec<EchoForm>> {
    let limit = limit.min(MAX_LIST_LIMIT) as i64;
    let rows = match domain {
        Some(d) => {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM echo_forms WHERE domain = ?1
                 ORDER BY created_at, anchor LIMIT ?2"
            );
            collect_rows(conn, &sql, params![d, limit])?
        }
        None => {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM echo_forms ORDER BY created_at, anchor LIMIT ?1"
            );
            collect_rows(conn, &sql, params![limit])?
        }
    };
    rows.into_iter().map(FormRow::into_form).collect()
}

/// Every form, unbounded. Used by the decay sweep inside its transaction.
pub fn all_forms(conn: &Connection) -> LatticeResult<Vec<EchoForm>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM echo_forms ORDER BY anchor");
    let rows = collect_rows(conn, &sql, [])?;
    rows.into_iter().map(FormRow::into_form).collect()
}

pub fn count_forms(conn: &Connection, domain: Option<&str>) -> LatticeResult<usize> {
    let count: i64 = match domain {
        Some(d) => conn.query_row(
            "SELECT COUNT(*) FROM echo_forms WHERE domain = ?1",
            params![d],
            |row| row.get(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM echo_forms", [], |row| row.get(0)),
    }
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

/// Delete forms created at or before `cutoff`. Returns the exact row count.
pub fn prune_forms_before(conn: &Connection, cutoff: DateTime<Utc>) -> LatticeResult<usize> {
    conn.execute(
        "DELETE FROM echo_forms WHERE created_at <= ?1",
        params![to_db_string(&cutoff)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn delete_all_forms(conn: &Connection) -> LatticeResult<usize> {
    conn.execute("DELETE FROM echo_forms", [])
        .map_err(|e| to_storage_err(e.to_string()))
}

fn collect_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> LatticeResult<Vec<FormRow>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, FormRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows)
}

struct FormRow {
    anchor: String,
    domain: String,
    terms: String,
    phase: String,
    topology: String,
    trace_signature: String,
    recursive: bool,
    created_at: String,
    updated_at: String,
}

impl FormRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            anchor: row.get(0)?,
            domain: row.get(1)?,
            terms: row.get(2)?,
            phase: row.get(3)?,
            topology: row.get(4)?,
            trace_signature: row.get(5)?,
            recursive: row.get::<_, i64>(6)? != 0,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_form(self) -> LatticeResult<EchoForm> {
        let bad = |what: &str, e: &dyn std::fmt::Display| {
            corrupt_row("echo_forms", format!("{} {what}: {e}", self.anchor))
        };
        let terms: Vec<RawTerm> =
            serde_json::from_str(&self.terms).map_err(|e| bad("terms", &e))?;
        let topology: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&self.topology).map_err(|e| bad("topology", &e))?;
        let phase: FormPhase = self.phase.parse().map_err(|e| bad("phase", &e))?;
        let created_at = from_db_string(&self.created_at).map_err(|e| bad("created_at", &e))?;
        let updated_at = from_db_string(&self.updated_at).map_err(|e| bad("updated_at", &e))?;

        let flat = FlatForm {
            anchor: self.anchor.clone(),
            domain: self.domain,
            phase,
            terms,
            topology,
            trace_signature: self.trace_signature,
            recursive: self.recursive,
            created_at,
            updated_at: Some(updated_at),
        };
        EchoForm::from_flat(flat).map_err(|e| corrupt_row("echo_forms", format!("{}: {e}", self.anchor)))
    }
}
