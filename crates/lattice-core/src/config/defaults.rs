// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "lattice.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Decay ---
pub const DEFAULT_BASE_TAU_DAYS: f64 = 7.0;
pub const DEFAULT_SWEEP_TAU_DAYS: f64 = 7.0;

// --- Resolver ---
pub const DEFAULT_DOMAIN: &str = "contradiction";
pub const DEFAULT_SEED_INTENSITY: f64 = 1.0;
pub const DEFAULT_EVENT_INTENSITY: f64 = 1.0;

// --- Reactor ---
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CHUNK_SIZE: usize = 64;
pub const DEFAULT_CYCLES: usize = 1;
pub const DEFAULT_CHUNK_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RESONANCE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 10_000;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
