//! Artifact definitions: named collection recipes with templated targets.

use hostfacts_core::KnowledgeBase;
use serde::{Deserialize, Serialize};

use super::{conditions_hold, os_supported};
use crate::condition::ConditionError;
use crate::environ::expand_windows_environment_variables;
use crate::error::EvaluationError;
use crate::interpolation::interpolate_list_kb_attributes;

/// Kind of location an artifact source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    File,
    Directory,
    RegistryKey,
    RegistryValue,
    Path,
}

/// One source of an artifact. `paths` may contain `%%kb%%` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub supported_os: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Run `%VAR%` expansion over each interpolated path.
    #[serde(default)]
    pub expand_environment: bool,
}

impl ArtifactSource {
    pub fn applies_to(&self, kb: &KnowledgeBase) -> Result<bool, ConditionError> {
        if !os_supported(&self.supported_os, kb) {
            return Ok(false);
        }
        conditions_hold(&self.conditions, kb)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDefinition {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub supported_os: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub sources: Vec<ArtifactSource>,
}

/// A concrete location to collect from one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionTarget {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub path: String,
}

impl ArtifactDefinition {
    /// Whether this artifact should be collected from the host at all.
    pub fn applies_to(&self, kb: &KnowledgeBase) -> Result<bool, ConditionError> {
        if !os_supported(&self.supported_os, kb) {
            return Ok(false);
        }
        conditions_hold(&self.conditions, kb)
    }

    /// Resolve every applicable source into concrete targets, in source order.
    pub fn resolve_targets(
        &self,
        kb: &KnowledgeBase,
        ignore_errors: bool,
    ) -> Result<Vec<CollectionTarget>, EvaluationError> {
        let mut targets = Vec::new();
        for source in &self.sources {
            if !source.applies_to(kb)? {
                continue;
            }
            for path in interpolate_list_kb_attributes(&source.paths, kb, ignore_errors)? {
                let path = if source.expand_environment {
                    expand_windows_environment_variables(&path, kb)
                } else {
                    path
                };
                targets.push(CollectionTarget {
                    source_type: source.source_type,
                    path,
                });
            }
        }
        Ok(targets)
    }
}
