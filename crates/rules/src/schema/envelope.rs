//! Definition envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use super::{Definition, DefinitionKind};

/// Lightweight first-pass deserializer that reads only the `kind` header.
///
/// Used during two-pass loading: first extract `kind` to determine the
/// concrete type, then deserialize the remaining fields into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionEnvelope {
    pub kind: String,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl DefinitionEnvelope {
    /// Parse the `kind` field into a typed [`DefinitionKind`].
    pub fn definition_kind(&self) -> std::result::Result<DefinitionKind, String> {
        self.kind.parse()
    }

    /// Two-pass: deserialize the remaining fields into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<Definition, String> {
        match self.definition_kind()? {
            DefinitionKind::Artifact => serde_yaml::from_value(self.rest.clone())
                .map(Definition::Artifact)
                .map_err(|e| e.to_string()),
            DefinitionKind::Check => serde_yaml::from_value(self.rest.clone())
                .map(Definition::Check)
                .map_err(|e| e.to_string()),
        }
    }
}
