use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use lattice_core::config::MigrationPhase;
use lattice_core::identity::IdentityType;

/// Snapshot of dual-write counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualWriteStats {
    pub phase: MigrationPhase,
    pub canonical_writes: u64,
    pub mirrored_nodes: u64,
    pub mirrored_relations: u64,
    pub mirror_failures: u64,
    /// Mirrored / attempted. 1.0 before any attempt.
    pub success_rate: f64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    canonical_writes: AtomicU64,
    mirrored_nodes: AtomicU64,
    mirrored_relations: AtomicU64,
    mirror_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn record_canonical(&self) {
        self.canonical_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_mirrored(&self, identity_type: IdentityType) {
        let counter = match identity_type {
            IdentityType::Node => &self.mirrored_nodes,
            IdentityType::Relation => &self.mirrored_relations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.mirror_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, phase: MigrationPhase) -> DualWriteStats {
        let mirrored_nodes = self.mirrored_nodes.load(Ordering::Relaxed);
        let mirrored_relations = self.mirrored_relations.load(Ordering::Relaxed);
        let mirror_failures = self.mirror_failures.load(Ordering::Relaxed);
        let mirrored = mirrored_nodes + mirrored_relations;
        let attempted = mirrored + mirror_failures;
        DualWriteStats {
            phase,
            canonical_writes: self.canonical_writes.load(Ordering::Relaxed),
            mirrored_nodes,
            mirrored_relations,
            mirror_failures,
            success_rate: if attempted == 0 {
                1.0
            } else {
                mirrored as f64 / attempted as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_counts_failures() {
        let c = Counters::default();
        assert_eq!(c.snapshot(MigrationPhase::DualWrite).success_rate, 1.0);
        c.record_mirrored(IdentityType::Node);
        c.record_mirrored(IdentityType::Relation);
        c.record_mirrored(IdentityType::Node);
        c.record_failure();
        let s = c.snapshot(MigrationPhase::DualWrite);
        assert_eq!(s.mirrored_nodes, 2);
        assert_eq!(s.mirrored_relations, 1);
        assert!((s.success_rate - 0.75).abs() < 1e-12);
    }
}
