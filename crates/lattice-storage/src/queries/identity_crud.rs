//! Upsert, get, list and count for identities.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use lattice_core::constants::MAX_LIST_LIMIT;
use lattice_core::errors::LatticeResult;
use lattice_core::identity::{Identity, IdentityType, WeightedSymbol};
use lattice_core::time::{from_db_string, to_db_string};

use crate::{corrupt_row, to_storage_err};

const SELECT_COLUMNS: &str = "id, identity_type, raw, terms, tags, relationships, weight, meta, \
                              created_at, updated_at";

/// The `relationships` column.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Relationships {
    #[serde(default)]
    related_ids: Vec<String>,
    #[serde(default = "full_confidence")]
    confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

/// Insert or update an identity. A re-stored id keeps its first `created_at`.
/// Returns `true` when the row did not exist before.
pub fn upsert_identity(conn: &Connection, identity: &Identity) -> LatticeResult<bool> {
    let existed = identity_exists(conn, &identity.id)?;

    let terms = serde_json::to_string(&identity.terms)?;
    let tags = serde_json::to_string(&identity.tags)?;
    let relationships = serde_json::to_string(&Relationships {
        related_ids: identity.related_ids.clone(),
        confidence: identity.confidence,
    })?;
    let meta = serde_json::to_string(&identity.meta)?;

    conn.execute(
        "INSERT INTO identities (
            id, identity_type, raw, terms, tags, relationships, weight, meta,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            identity_type = excluded.identity_type,
            raw           = excluded.raw,
            terms         = excluded.terms,
            tags          = excluded.tags,
            relationships = excluded.relationships,
            weight        = excluded.weight,
            meta          = excluded.meta,
            updated_at    = MAX(identities.updated_at, excluded.updated_at)",
        params![
            identity.id,
            identity.identity_type.as_str(),
            identity.raw,
            terms,
            tags,
            relationships,
            identity.weight,
            meta,
            to_db_string(&identity.created_at),
            to_db_string(&identity.updated_at),
        ],
    )
    .map_err(|e| to_storage_err(format!("upsert identity {}: {e}", identity.id)))?;

    Ok(!existed)
}

pub fn identity_exists(conn: &Connection, id: &str) -> LatticeResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM identities WHERE id = ?1", params![id], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(found.is_some())
}

/// Get a single identity. `Ok(None)` on a miss.
pub fn get_identity(conn: &Connection, id: &str) -> LatticeResult<Option<Identity>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM identities WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], IdentityRow::from_row)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(IdentityRow::into_identity).transpose()
}

/// List identities oldest first, optionally filtered by type.
pub fn list_identities(
    conn: &Connection,
    identity_type: Option<IdentityType>,
    limit: usize,
) -> LatticeResult<Vec<Identity>> {
    let limit = limit.min(MAX_LIST_LIMIT) as i64;
    let rows = match identity_type {
        Some(t) => {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM identities WHERE identity_type = ?1
                 ORDER BY created_at, id LIMIT ?2"
            );
            collect_rows(conn, &sql, params![t.as_str(), limit])?
        }
        None => {
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM identities ORDER BY created_at, id LIMIT ?1"
            );
            collect_rows(conn, &sql, params![limit])?
        }
    };
    rows.into_iter().map(IdentityRow::into_identity).collect()
}

/// Keyset page of identities with `id > after_id`, in id order.
pub fn list_identities_after(
    conn: &Connection,
    after_id: Option<&str>,
    limit: usize,
) -> LatticeResult<Vec<Identity>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM identities WHERE id > ?1 ORDER BY id LIMIT ?2"
    );
    let rows = collect_rows(conn, &sql, params![after_id.unwrap_or(""), limit as i64])?;
    rows.into_iter().map(IdentityRow::into_identity).collect()
}

pub fn count_identities(
    conn: &Connection,
    identity_type: Option<IdentityType>,
) -> LatticeResult<usize> {
    let count: i64 = match identity_type {
        Some(t) => conn.query_row(
            "SELECT COUNT(*) FROM identities WHERE identity_type = ?1",
            params![t.as_str()],
            |row| row.get(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0)),
    }
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

pub fn delete_all_identities(conn: &Connection) -> LatticeResult<usize> {
    conn.execute("DELETE FROM identities", [])
        .map_err(|e| to_storage_err(e.to_string()))
}

fn collect_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> LatticeResult<Vec<IdentityRow>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, IdentityRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows)
}

/// Raw column values. Decoding happens outside the rusqlite callback so
/// JSON and timestamp failures surface as corrupt-row errors.
struct IdentityRow {
    id: String,
    identity_type: String,
    raw: String,
    terms: String,
    tags: String,
    relationships: String,
    weight: f64,
    meta: String,
    created_at: String,
    updated_at: String,
}

impl IdentityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            identity_type: row.get(1)?,
            raw: row.get(2)?,
            terms: row.get(3)?,
            tags: row.get(4)?,
            relationships: row.get(5)?,
            weight: row.get(6)?,
            meta: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_identity(self) -> LatticeResult<Identity> {
        let bad = |what: &str, e: &dyn std::fmt::Display| {
            corrupt_row("identities", format!("{} {what}: {e}", self.id))
        };
        let identity_type: IdentityType =
            self.identity_type.parse().map_err(|e| bad("identity_type", &e))?;
        let terms: Vec<WeightedSymbol> =
            serde_json::from_str(&self.terms).map_err(|e| bad("terms", &e))?;
        let tags: BTreeSet<String> =
            serde_json::from_str(&self.tags).map_err(|e| bad("tags", &e))?;
        let relationships: Relationships =
            serde_json::from_str(&self.relationships).map_err(|e| bad("relationships", &e))?;
        let meta: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&self.meta).map_err(|e| bad("meta", &e))?;
        let created_at = from_db_string(&self.created_at).map_err(|e| bad("created_at", &e))?;
        let updated_at = from_db_string(&self.updated_at).map_err(|e| bad("updated_at", &e))?;

        Ok(Identity {
            id: self.id,
            identity_type,
            raw: self.raw,
            terms,
            tags,
            weight: self.weight,
            related_ids: relationships.related_ids,
            confidence: relationships.confidence,
            meta,
            created_at,
            updated_at,
        })
    }
}
