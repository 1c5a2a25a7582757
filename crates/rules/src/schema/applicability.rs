//! Shared applicability tests for artifacts, sources and checks.

use hostfacts_core::{FactRecord, KnowledgeBase};

use crate::condition::{check_condition, ConditionError};

/// An empty list supports every OS. Otherwise the host OS must be known and
/// listed (case-insensitive).
pub fn os_supported(supported_os: &[String], kb: &KnowledgeBase) -> bool {
    if supported_os.is_empty() {
        return true;
    }
    kb.os_family()
        .is_some_and(|os| supported_os.iter().any(|s| s.eq_ignore_ascii_case(os)))
}

/// Every condition must hold; evaluation stops at the first false one.
pub fn conditions_hold(
    conditions: &[String],
    subject: &dyn FactRecord,
) -> Result<bool, ConditionError> {
    for condition in conditions {
        if !check_condition(condition, subject)? {
            return Ok(false);
        }
    }
    Ok(true)
}
