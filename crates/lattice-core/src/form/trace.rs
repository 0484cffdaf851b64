//! Rolling trace signature: `trace_n = hash(trace_{n-1}, state_n)`.
//!
//! Two forms replaying the same mutations in the same order end with the
//! same signature; any divergence in history changes every later link.

use crate::hash::short_hash;

/// Next link in the chain.
pub fn chain(prev: &str, state: &str) -> String {
    short_hash([prev.as_bytes(), state.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GENESIS_TRACE;
    use crate::hash::is_short_hash;

    #[test]
    fn chain_is_deterministic_and_order_sensitive() {
        let a = chain(&chain(GENESIS_TRACE, "x"), "y");
        let b = chain(&chain(GENESIS_TRACE, "x"), "y");
        let c = chain(&chain(GENESIS_TRACE, "y"), "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(is_short_hash(&a));
    }
}
