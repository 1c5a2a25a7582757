//! Multi-kind definition container and accessors.

use super::{ArtifactDefinition, CheckDefinition, DefinitionKind};
use crate::condition::compile_condition;

/// A fully deserialized definition of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Artifact -- what to collect and where it lives.
    Artifact(ArtifactDefinition),
    /// Check -- which artifacts a host rule needs.
    Check(CheckDefinition),
}

impl Definition {
    /// Artifact name or check ID.
    pub fn id(&self) -> &str {
        match self {
            Definition::Artifact(artifact) => &artifact.name,
            Definition::Check(check) => &check.check_id,
        }
    }

    /// Get the definition kind.
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Definition::Artifact(_) => DefinitionKind::Artifact,
            Definition::Check(_) => DefinitionKind::Check,
        }
    }

    /// Conditions attached to this definition (and, for artifacts, its sources).
    pub fn conditions(&self) -> Vec<&str> {
        match self {
            Definition::Artifact(artifact) => artifact
                .conditions
                .iter()
                .chain(artifact.sources.iter().flat_map(|s| s.conditions.iter()))
                .map(String::as_str)
                .collect(),
            Definition::Check(check) => check.conditions.iter().map(String::as_str).collect(),
        }
    }

    /// Try to extract as an `ArtifactDefinition` reference.
    pub fn as_artifact(&self) -> Option<&ArtifactDefinition> {
        match self {
            Definition::Artifact(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Try to extract as a `CheckDefinition` reference.
    pub fn as_check(&self) -> Option<&CheckDefinition> {
        match self {
            Definition::Check(check) => Some(check),
            _ => None,
        }
    }

    /// Structural validation: a non-empty identifier, at least one source
    /// per artifact, and conditions that compile.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id().trim().is_empty() {
            let field = match self.kind() {
                DefinitionKind::Artifact => "name",
                DefinitionKind::Check => "check_id",
            };
            return Err(format!("{} {} must not be empty", self.kind(), field));
        }
        if let Definition::Artifact(artifact) = self {
            if artifact.sources.is_empty() {
                return Err(format!("artifact '{}' has no sources", artifact.name));
            }
        }
        for condition in self.conditions() {
            compile_condition(condition)
                .map_err(|e| format!("{} '{}': {}", self.kind(), self.id(), e))?;
        }
        Ok(())
    }
}
