use serde::{Deserialize, Serialize};

use super::defaults;

/// Lattice resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Domain every resolved pair is scoped to.
    pub domain: String,
    /// Intensity of the seed term written when a form is created.
    pub seed_intensity: f64,
    /// Base intensity of an event term, before entropy weighting.
    pub event_intensity: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            domain: defaults::DEFAULT_DOMAIN.to_string(),
            seed_intensity: defaults::DEFAULT_SEED_INTENSITY,
            event_intensity: defaults::DEFAULT_EVENT_INTENSITY,
        }
    }
}
