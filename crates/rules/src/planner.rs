//! Per-host collection planning.
//!
//! Given a host's knowledge base, picks the checks that apply to it, gathers
//! the artifacts those checks want and resolves each artifact into concrete
//! collection targets.

use std::collections::{BTreeMap, BTreeSet};

use hostfacts_core::KnowledgeBase;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::EvaluationError;
use crate::schema::{ArtifactDefinition, CheckDefinition, CollectionTarget};

/// What to collect from one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionPlan {
    /// Checks that apply to the host, sorted by id.
    pub checks_run: Vec<String>,
    /// Artifact names wanted by those checks, sorted.
    pub artifacts_wanted: Vec<String>,
    /// Wanted artifacts with no definition.
    pub missing_artifacts: Vec<String>,
    /// Wanted artifacts that are defined but do not apply to the host.
    pub skipped_artifacts: Vec<String>,
    /// Resolved targets per applicable artifact.
    pub targets: BTreeMap<String, Vec<CollectionTarget>>,
}

impl CollectionPlan {
    /// Total number of resolved targets.
    pub fn target_count(&self) -> usize {
        self.targets.values().map(Vec::len).sum()
    }
}

/// Build the collection plan for the host described by `kb`.
pub fn plan_collection<'a, I>(
    kb: &KnowledgeBase,
    checks: I,
    artifacts: &BTreeMap<String, ArtifactDefinition>,
    ignore_errors: bool,
) -> Result<CollectionPlan, EvaluationError>
where
    I: IntoIterator<Item = &'a CheckDefinition>,
{
    let mut selected: Vec<&CheckDefinition> = Vec::new();
    for check in checks {
        if check.applies_to(kb)? {
            selected.push(check);
        } else {
            debug!(check_id = %check.check_id, "check does not apply to host");
        }
    }
    selected.sort_by(|a, b| a.check_id.cmp(&b.check_id));

    let wanted: BTreeSet<&str> = selected
        .iter()
        .flat_map(|c| c.artifacts.iter().map(String::as_str))
        .collect();

    let mut plan = CollectionPlan {
        checks_run: selected.iter().map(|c| c.check_id.clone()).collect(),
        artifacts_wanted: wanted.iter().map(|s| s.to_string()).collect(),
        ..CollectionPlan::default()
    };

    for name in wanted {
        let Some(artifact) = artifacts.get(name) else {
            debug!(artifact = %name, "wanted artifact is not defined");
            plan.missing_artifacts.push(name.to_string());
            continue;
        };
        if !artifact.applies_to(kb)? {
            debug!(artifact = %name, "artifact does not apply to host");
            plan.skipped_artifacts.push(name.to_string());
            continue;
        }
        let targets = artifact.resolve_targets(kb, ignore_errors)?;
        plan.targets.insert(name.to_string(), targets);
    }

    info!(
        checks = plan.checks_run.len(),
        artifacts = plan.targets.len(),
        targets = plan.target_count(),
        missing = plan.missing_artifacts.len(),
        "collection plan built"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use hostfacts_core::User;

    use super::*;

    fn artifact(yaml: &str) -> ArtifactDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn check(yaml: &str) -> CheckDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn artifacts() -> BTreeMap<String, ArtifactDefinition> {
        [
            artifact(
                "name: SshdConfigFile\nsupported_os: [Linux, Darwin]\n\
                 sources:\n  - type: FILE\n    paths: [/etc/ssh/sshd_config]\n",
            ),
            artifact(
                "name: DebianPackagesStatus\nsupported_os: [Linux]\n\
                 sources:\n  - type: FILE\n    paths: [/var/lib/dpkg/status]\n",
            ),
            artifact(
                "name: WMIInstalledSoftware\nsupported_os: [Windows]\n\
                 sources:\n  - type: PATH\n    \
                 paths: [\"%%environ_systemroot%%\\\\System32\\\\wbem\"]\n",
            ),
            artifact(
                "name: UserHistory\n\
                 sources:\n  - type: FILE\n    paths: [\"%%users.homedir%%/.bash_history\"]\n",
            ),
        ]
        .into_iter()
        .map(|a| (a.name.clone(), a))
        .collect()
    }

    fn checks() -> Vec<CheckDefinition> {
        vec![
            check(
                "check_id: SW-CHECK\nartifacts: [DebianPackagesStatus, WMIInstalledSoftware]\n\
                 conditions: [\"os == 'Linux' or os == 'Windows'\"]\n",
            ),
            check("check_id: SSHD-CHECK\nsupported_os: [Linux]\nartifacts: [SshdConfigFile]\n"),
            check("check_id: HISTORY-CHECK\nartifacts: [UserHistory, BashRc]\n"),
        ]
    }

    fn linux_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.os = "Linux".to_string();
        kb.add_user(User {
            username: "user1".to_string(),
            homedir: "/home/user1".to_string(),
            ..User::default()
        });
        kb
    }

    #[test]
    fn linux_host_plan() {
        let plan = plan_collection(&linux_kb(), &checks(), &artifacts(), false).unwrap();
        assert_eq!(plan.checks_run, vec!["HISTORY-CHECK", "SSHD-CHECK", "SW-CHECK"]);
        assert_eq!(
            plan.artifacts_wanted,
            vec![
                "BashRc",
                "DebianPackagesStatus",
                "SshdConfigFile",
                "UserHistory",
                "WMIInstalledSoftware",
            ]
        );
        assert_eq!(plan.missing_artifacts, vec!["BashRc"]);
        assert_eq!(plan.skipped_artifacts, vec!["WMIInstalledSoftware"]);
        assert_eq!(plan.targets["SshdConfigFile"][0].path, "/etc/ssh/sshd_config");
        assert_eq!(plan.targets["UserHistory"][0].path, "/home/user1/.bash_history");
        assert_eq!(plan.target_count(), 3);
    }

    #[test]
    fn windows_host_plan() {
        let mut kb = KnowledgeBase::new();
        kb.os = "Windows".to_string();
        kb.environ_systemroot = "C:\\Windows".to_string();

        let plan = plan_collection(&kb, &checks(), &artifacts(), true).unwrap();
        assert_eq!(plan.checks_run, vec!["HISTORY-CHECK", "SW-CHECK"]);
        assert_eq!(plan.skipped_artifacts, vec!["DebianPackagesStatus"]);
        assert_eq!(plan.targets["WMIInstalledSoftware"][0].path, "C:\\Windows\\System32\\wbem");
        // No users in the knowledge base: the history pattern is skipped.
        assert!(plan.targets["UserHistory"].is_empty());
    }

    #[test]
    fn strict_planning_propagates_interpolation_errors() {
        let mut kb = KnowledgeBase::new();
        kb.os = "Windows".to_string();

        let err = plan_collection(&kb, &checks(), &artifacts(), false).unwrap_err();
        assert!(matches!(err, EvaluationError::Interpolation(_)));
    }

    #[test]
    fn invalid_check_condition_is_an_error() {
        let broken = vec![check("check_id: BROKEN\nconditions: [\"os ==\"]\n")];
        let err = plan_collection(&linux_kb(), &broken, &artifacts(), false).unwrap_err();
        assert!(matches!(err, EvaluationError::Condition(_)));
    }

    #[test]
    fn unknown_os_runs_only_unrestricted_checks() {
        let plan = plan_collection(&KnowledgeBase::new(), &checks(), &artifacts(), true).unwrap();
        assert_eq!(plan.checks_run, vec!["HISTORY-CHECK"]);
    }
}
