//! v001: canonical tables: identities, echo_forms.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS identities (
    id             TEXT PRIMARY KEY,
    identity_type  TEXT NOT NULL CHECK (identity_type IN ('node', 'relation')),
    raw            TEXT NOT NULL,
    terms          TEXT NOT NULL DEFAULT '[]',
    tags           TEXT NOT NULL DEFAULT '[]',
    relationships  TEXT NOT NULL DEFAULT '{}',
    weight         REAL NOT NULL DEFAULT 1.0,
    meta           TEXT NOT NULL DEFAULT '{}',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_identities_type ON identities(identity_type);
CREATE INDEX IF NOT EXISTS idx_identities_created ON identities(created_at);

CREATE TABLE IF NOT EXISTS echo_forms (
    anchor           TEXT PRIMARY KEY,
    domain           TEXT NOT NULL,
    terms            TEXT NOT NULL DEFAULT '[]',
    phase            TEXT NOT NULL,
    topology         TEXT NOT NULL DEFAULT '{}',
    trace_signature  TEXT NOT NULL,
    recursive        INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (anchor, domain)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_echo_forms_domain ON echo_forms(domain);
CREATE INDEX IF NOT EXISTS idx_echo_forms_created ON echo_forms(created_at);
";
