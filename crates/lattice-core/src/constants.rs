/// Lattice system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of hex characters kept from a blake3 digest for ids, anchors, and traces.
pub const HASH_HEX_LEN: usize = 16;

/// Id prefix for node identities.
pub const NODE_ID_PREFIX: &str = "node";

/// Id prefix for relation identities.
pub const RELATION_ID_PREFIX: &str = "rel";

/// Minimum number of related ids on a relation identity.
pub const MIN_RELATED_IDS: usize = 2;

/// Trace signature of a form that has never been mutated.
pub const GENESIS_TRACE: &str = "0000000000000000";

/// Seconds per day, used for all day-denominated decay constants.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Maximum number of rows returned by a single list query.
pub const MAX_LIST_LIMIT: usize = 10_000;

/// Maximum batch size for bulk operations (legacy backfill, reactor write-back).
pub const MAX_BULK_BATCH_SIZE: usize = 1000;
