//! Check definitions: host rules and the artifacts they need.

use hostfacts_core::KnowledgeBase;
use serde::{Deserialize, Serialize};

use super::{conditions_hold, os_supported};
use crate::condition::ConditionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDefinition {
    pub check_id: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub supported_os: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Names of the artifacts this check evaluates.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl CheckDefinition {
    /// Whether this check should run against the host.
    pub fn applies_to(&self, kb: &KnowledgeBase) -> Result<bool, ConditionError> {
        if !os_supported(&self.supported_os, kb) {
            return Ok(false);
        }
        conditions_hold(&self.conditions, kb)
    }
}
