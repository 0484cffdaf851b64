//! Lattice configuration: one TOML document, every section optional.

pub mod decay_config;
pub mod defaults;
pub mod migration_config;
pub mod reactor_config;
pub mod resolver_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use decay_config::DecayConfig;
pub use migration_config::{MigrationConfig, MigrationPhase};
pub use reactor_config::ReactorConfig;
pub use resolver_config::ResolverConfig;
pub use storage_config::StorageConfig;

use crate::errors::ConfigError;

/// Observability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `LATTICE_LOG` is not set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub storage: StorageConfig,
    pub decay: DecayConfig,
    pub resolver: ResolverConfig,
    pub reactor: ReactorConfig,
    pub migration: MigrationConfig,
    pub observability: ObservabilityConfig,
}

impl LatticeConfig {
    /// Parse from a TOML string. Missing keys take their defaults.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&raw)
    }

    /// Reject values that would make an engine misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("decay.base_tau_days", self.decay.base_tau_days)?;
        positive("decay.sweep_tau_days", self.decay.sweep_tau_days)?;
        non_negative("resolver.seed_intensity", self.resolver.seed_intensity)?;
        positive("resolver.event_intensity", self.resolver.event_intensity)?;
        if self.resolver.domain.trim().is_empty() {
            return Err(invalid("resolver.domain", "must not be empty"));
        }
        if self.reactor.workers == 0 {
            return Err(invalid("reactor.workers", "must be at least 1"));
        }
        if self.reactor.chunk_size < 2 {
            return Err(invalid("reactor.chunk_size", "must be at least 2"));
        }
        if self.reactor.chunk_timeout_ms == 0 {
            return Err(invalid("reactor.chunk_timeout_ms", "must be positive"));
        }
        let t = self.reactor.resonance_threshold;
        if !(t.is_finite() && (0.0..=1.0).contains(&t)) {
            return Err(invalid("reactor.resonance_threshold", "must be in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, "must be a positive finite number"))
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(key, "must be a non-negative finite number"))
    }
}
