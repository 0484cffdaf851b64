//! Span definitions for the runtime's top-level operations.

/// Span around one pairwise resolution.
#[macro_export]
macro_rules! resolve_span {
    ($a:expr, $b:expr) => {
        tracing::info_span!("lattice.resolve", a = %$a, b = %$b)
    };
}

/// Span around one reactor batch.
#[macro_export]
macro_rules! batch_span {
    ($identities:expr) => {
        tracing::info_span!("lattice.batch", identities = $identities)
    };
}

/// Span around a decay sweep or prune.
#[macro_export]
macro_rules! maintenance_span {
    ($op:expr) => {
        tracing::info_span!("lattice.maintenance", op = $op)
    };
}
