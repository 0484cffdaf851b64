use std::fmt;

use serde::{Deserialize, Serialize};

/// Legacy-schema migration phase. Transitions only move forward:
/// `Off -> DualWrite -> LegacyRetired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    #[default]
    Off,
    DualWrite,
    LegacyRetired,
}

impl MigrationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::DualWrite => "dual_write",
            Self::LegacyRetired => "legacy_retired",
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::DualWrite => 1,
            Self::LegacyRetired => 2,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Off,
            1 => Self::DualWrite,
            _ => Self::LegacyRetired,
        }
    }

    /// Whether identity writes are mirrored in this phase.
    pub fn mirrors(self) -> bool {
        self == Self::DualWrite
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Phase the compatibility layer starts in.
    pub phase: MigrationPhase,
}
