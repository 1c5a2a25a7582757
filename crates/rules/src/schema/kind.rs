//! Definition kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported definition kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Artifact,
    Check,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Artifact => write!(f, "Artifact"),
            DefinitionKind::Check => write!(f, "Check"),
        }
    }
}

impl FromStr for DefinitionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Artifact" => Ok(DefinitionKind::Artifact),
            "Check" => Ok(DefinitionKind::Check),
            other => Err(format!("unknown definition kind: '{}'", other)),
        }
    }
}
