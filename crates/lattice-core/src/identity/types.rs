use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The two entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    /// Content-derived entity with no relationships.
    Node,
    /// Relationship / contradiction between other identities.
    Relation,
}

impl IdentityType {
    pub const ALL: [IdentityType; 2] = [Self::Node, Self::Relation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "relation" => Ok(Self::Relation),
            other => Err(ValidationError::Malformed {
                reason: format!("unknown identity type `{other}`"),
            }),
        }
    }
}
