use serde::{Deserialize, Serialize};

use super::defaults;

/// Decay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Base time constant (days) for read-time entropy-adaptive decay.
    pub base_tau_days: f64,
    /// Base time constant (days) used by scheduled compaction sweeps.
    pub sweep_tau_days: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            base_tau_days: defaults::DEFAULT_BASE_TAU_DAYS,
            sweep_tau_days: defaults::DEFAULT_SWEEP_TAU_DAYS,
        }
    }
}
