//! v002: legacy mirror tables used while the dual-write migration runs.
//!
//! Column names follow the pre-lattice schema so older readers keep working.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS legacy_nodes (
    node_id   TEXT PRIMARY KEY,
    content   TEXT NOT NULL,
    symbols   TEXT NOT NULL DEFAULT '[]',
    labels    TEXT NOT NULL DEFAULT '[]',
    strength  REAL NOT NULL DEFAULT 1.0,
    created   TEXT NOT NULL,
    modified  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS legacy_relations (
    relation_id  TEXT PRIMARY KEY,
    content      TEXT NOT NULL,
    members      TEXT NOT NULL DEFAULT '[]',
    certainty    REAL NOT NULL DEFAULT 1.0,
    created      TEXT NOT NULL,
    modified     TEXT NOT NULL
);
";
