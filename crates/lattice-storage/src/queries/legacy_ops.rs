//! Mirror writes and reads against the legacy `legacy_nodes` /
//! `legacy_relations` schema.
//!
//! Field mapping:
//! - nodes: `content` = raw, `symbols` = `[[symbol, weight], ..]`,
//!   `labels` = tags, `strength` = weight;
//! - relations: `content` = raw, `members` = related ids, `certainty` = confidence;
//! - both: `created` / `modified` = created_at / updated_at.

use rusqlite::{params, Connection, OptionalExtension};

use lattice_core::errors::LatticeResult;
use lattice_core::identity::{Identity, IdentityType};
use lattice_core::time::to_db_string;

use crate::to_storage_err;

/// A legacy row read back for consistency audits. Values are kept in their
/// stored text form.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRow {
    pub content: String,
    /// `symbols` for nodes, `members` for relations.
    pub payload: String,
    /// `labels` for nodes; empty for relations.
    pub labels: String,
    /// `strength` for nodes, `certainty` for relations.
    pub score: f64,
    pub created: String,
    pub modified: String,
}

/// The legacy encoding of a canonical identity.
pub fn legacy_view(identity: &Identity) -> LatticeResult<LegacyRow> {
    Ok(match identity.identity_type {
        IdentityType::Node => {
            let symbols: Vec<(&str, f64)> = identity
                .terms
                .iter()
                .map(|t| (t.symbol.as_str(), t.weight))
                .collect();
            LegacyRow {
                content: identity.raw.clone(),
                payload: serde_json::to_string(&symbols)?,
                labels: serde_json::to_string(&identity.tags)?,
                score: identity.weight,
                created: to_db_string(&identity.created_at),
                modified: to_db_string(&identity.updated_at),
            }
        }
        IdentityType::Relation => LegacyRow {
            content: identity.raw.clone(),
            payload: serde_json::to_string(&identity.related_ids)?,
            labels: String::new(),
            score: identity.confidence,
            created: to_db_string(&identity.created_at),
            modified: to_db_string(&identity.updated_at),
        },
    })
}

/// Upsert the legacy row for `identity`, overwriting every column.
///
/// Pass the canonical row as read back from `identities`, not a caller's
/// payload: the canonical upsert keeps the first `created_at`, and the
/// mirror must carry the same value.
pub fn mirror_identity(conn: &Connection, identity: &Identity) -> LatticeResult<()> {
    let row = legacy_view(identity)?;
    let result = match identity.identity_type {
        IdentityType::Node => conn.execute(
            "INSERT INTO legacy_nodes (node_id, content, symbols, labels, strength, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(node_id) DO UPDATE SET
                content  = excluded.content,
                symbols  = excluded.symbols,
                labels   = excluded.labels,
                strength = excluded.strength,
                created  = excluded.created,
                modified = excluded.modified",
            params![
                identity.id,
                row.content,
                row.payload,
                row.labels,
                row.score,
                row.created,
                row.modified
            ],
        ),
        IdentityType::Relation => conn.execute(
            "INSERT INTO legacy_relations (relation_id, content, members, certainty, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(relation_id) DO UPDATE SET
                content   = excluded.content,
                members   = excluded.members,
                certainty = excluded.certainty,
                created   = excluded.created,
                modified  = excluded.modified",
            params![
                identity.id,
                row.content,
                row.payload,
                row.score,
                row.created,
                row.modified
            ],
        ),
    };
    result.map_err(|e| to_storage_err(format!("mirror {}: {e}", identity.id)))?;
    Ok(())
}

/// Read the legacy row for `id` of the given type. `Ok(None)` on a miss.
pub fn get_legacy(
    conn: &Connection,
    identity_type: IdentityType,
    id: &str,
) -> LatticeResult<Option<LegacyRow>> {
    let row = match identity_type {
        IdentityType::Node => conn
            .query_row(
                "SELECT content, symbols, labels, strength, created, modified
                 FROM legacy_nodes WHERE node_id = ?1",
                params![id],
                |row| {
                    Ok(LegacyRow {
                        content: row.get(0)?,
                        payload: row.get(1)?,
                        labels: row.get(2)?,
                        score: row.get(3)?,
                        created: row.get(4)?,
                        modified: row.get(5)?,
                    })
                },
            )
            .optional(),
        IdentityType::Relation => conn
            .query_row(
                "SELECT content, members, certainty, created, modified
                 FROM legacy_relations WHERE relation_id = ?1",
                params![id],
                |row| {
                    Ok(LegacyRow {
                        content: row.get(0)?,
                        payload: row.get(1)?,
                        labels: String::new(),
                        score: row.get(2)?,
                        created: row.get(3)?,
                        modified: row.get(4)?,
                    })
                },
            )
            .optional(),
    };
    row.map_err(|e| to_storage_err(e.to_string()))
}

pub fn legacy_exists(conn: &Connection, identity_type: IdentityType, id: &str) -> LatticeResult<bool> {
    let sql = match identity_type {
        IdentityType::Node => "SELECT 1 FROM legacy_nodes WHERE node_id = ?1",
        IdentityType::Relation => "SELECT 1 FROM legacy_relations WHERE relation_id = ?1",
    };
    let found: Option<i64> = conn
        .query_row(sql, params![id], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(found.is_some())
}

/// Delete every legacy row. Returns the number removed.
pub fn clear_legacy(conn: &Connection) -> LatticeResult<usize> {
    let nodes = conn
        .execute("DELETE FROM legacy_nodes", [])
        .map_err(|e| to_storage_err(e.to_string()))?;
    let relations = conn
        .execute("DELETE FROM legacy_relations", [])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(nodes + relations)
}
