//! Windows environment variable expansion against knowledge base facts.
//!
//! Unlike [`crate::interpolation`], expansion here is best-effort: a `%VAR%`
//! token that cannot be resolved is left in the output verbatim.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use hostfacts_core::{Fact, FactRecord, KnowledgeBase};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

const WIN_ENVIRON_PATTERN: &str = r"%([^%]+?)%";

static WIN_ENVIRON_REGEX: OnceLock<Regex> = OnceLock::new();

fn win_environ_regex() -> &'static Regex {
    WIN_ENVIRON_REGEX
        .get_or_init(|| Regex::new(WIN_ENVIRON_PATTERN).expect("invalid environment regex"))
}

/// Value of one variable in [`windows_environment_variables_map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Single(String),
    /// Per-user variables aggregated across every user, in user order.
    Multi(Vec<String>),
}

impl EnvValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            EnvValue::Single(s) => Some(s),
            EnvValue::Multi(_) => None,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            EnvValue::Single(s) => vec![s.as_str()],
            EnvValue::Multi(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Only plain, non-empty strings are substituted.
fn plain_text(fact: Option<Fact<'_>>) -> Option<&str> {
    fact.and_then(|f| f.as_text()).filter(|s| !s.is_empty())
}

fn expand_with<F>(data: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    win_environ_regex()
        .replace_all(data, |caps: &Captures<'_>| {
            lookup(&caps[1].to_lowercase()).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand `%VAR%` tokens using the knowledge base `environ_<var>` facts.
///
/// `"%SystemRoot%\\Logs"` becomes `"C:\\Windows\\Logs"` when
/// `environ_systemroot` is known, and is returned unchanged otherwise.
pub fn expand_windows_environment_variables<R>(data: &str, kb: &R) -> String
where
    R: FactRecord + ?Sized,
{
    expand_with(data, |var| {
        plain_text(kb.fact(&format!("environ_{}", var))).map(str::to_string)
    })
}

/// Expand `%VAR%` tokens using the fields of one user, selected by SID or
/// username. Without a matching user the string is returned unchanged.
pub fn expand_windows_user_environment_variables(
    data: &str,
    kb: &KnowledgeBase,
    sid: Option<&str>,
    username: Option<&str>,
) -> String {
    let user = kb.user(sid, username);
    expand_with(data, |var| {
        user.and_then(|u| plain_text(u.fact(var)).map(str::to_string))
    })
}

/// Map of Windows environment variable names to the knowledge base values
/// they correspond to.
///
/// Only facts that are set appear. `programfiles` also populates
/// `programw6432` and `allusersprofile` also populates `programdata`.
pub fn windows_environment_variables_map(kb: &KnowledgeBase) -> BTreeMap<String, EnvValue> {
    let mut environ_vars = BTreeMap::new();

    let scalars: [(&str, &str, &[&str]); 9] = [
        ("environ_path", "path", &[]),
        ("environ_temp", "temp", &[]),
        ("environ_systemroot", "systemroot", &[]),
        ("environ_windir", "windir", &[]),
        ("environ_programfiles", "programfiles", &["programw6432"]),
        ("environ_programfilesx86", "programfiles(x86)", &[]),
        ("environ_systemdrive", "systemdrive", &[]),
        ("environ_allusersprofile", "allusersprofile", &["programdata"]),
        ("environ_allusersappdata", "allusersappdata", &[]),
    ];
    for (fact, var, aliases) in scalars {
        if let Some(value) = kb.get(fact) {
            for name in std::iter::once(var).chain(aliases.iter().copied()) {
                environ_vars.insert(name.to_string(), EnvValue::Single(value.to_string()));
            }
        }
    }

    for field in ["appdata", "localappdata", "userdomain", "userprofile"] {
        let values: Vec<String> = kb
            .users
            .iter()
            .filter_map(|user| user.get(field))
            .map(str::to_string)
            .collect();
        if !values.is_empty() {
            environ_vars.insert(field.to_string(), EnvValue::Multi(values));
        }
    }

    environ_vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostfacts_core::User;

    fn windows_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.os = "Windows".to_string();
        kb.environ_systemroot = "C:\\Windows".to_string();
        kb.environ_programfiles = "C:\\Program Files".to_string();
        kb.environ_programfilesx86 = "C:\\Program Files (x86)".to_string();
        kb.environ_allusersprofile = "C:\\ProgramData".to_string();
        kb.add_user(User {
            username: "alice".to_string(),
            sid: "S-1-5-21-1001".to_string(),
            temp: "C:\\Users\\alice\\AppData\\Local\\Temp".to_string(),
            appdata: "C:\\Users\\alice\\AppData\\Roaming".to_string(),
            userprofile: "C:\\Users\\alice".to_string(),
            ..User::default()
        });
        kb.add_user(User {
            username: "bob".to_string(),
            sid: "S-1-5-21-1002".to_string(),
            userprofile: "C:\\Users\\bob".to_string(),
            ..User::default()
        });
        kb
    }

    #[test]
    fn expands_known_variable() {
        let kb = windows_kb();
        assert_eq!(
            expand_windows_environment_variables("%SystemRoot%\\Logs", &kb),
            "C:\\Windows\\Logs"
        );
    }

    #[test]
    fn unknown_variable_passes_through_verbatim() {
        let kb = KnowledgeBase::new();
        assert_eq!(
            expand_windows_environment_variables("%SystemRoot%\\Logs", &kb),
            "%SystemRoot%\\Logs"
        );
        assert_eq!(
            expand_windows_environment_variables("%NotAVar%;%windir%", &kb),
            "%NotAVar%;%windir%"
        );
    }

    #[test]
    fn mixes_resolved_and_unresolved_tokens() {
        let kb = windows_kb();
        assert_eq!(
            expand_windows_environment_variables("%ProgramFiles%|%TEMP%|%ProgramFiles(x86)%", &kb),
            "C:\\Program Files|%TEMP%|C:\\Program Files (x86)"
        );
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let kb = windows_kb();
        assert_eq!(expand_windows_environment_variables("100% sure", &kb), "100% sure");
    }

    #[test]
    fn user_variant_resolves_by_sid_and_username() {
        let kb = windows_kb();
        let sid = Some("S-1-5-21-1001");
        assert_eq!(
            expand_windows_user_environment_variables("%TEMP%\\x.log", &kb, sid, None),
            "C:\\Users\\alice\\AppData\\Local\\Temp\\x.log"
        );
        assert_eq!(
            expand_windows_user_environment_variables("%UserProfile%", &kb, None, Some("bob")),
            "C:\\Users\\bob"
        );
    }

    #[test]
    fn user_variant_prefers_sid_over_username() {
        let kb = windows_kb();
        let (bob, alice) = (Some("S-1-5-21-1002"), Some("alice"));
        assert_eq!(
            expand_windows_user_environment_variables("%UserProfile%", &kb, bob, alice),
            "C:\\Users\\bob"
        );
        // bob has no TEMP; alice's must not leak in through the username.
        assert_eq!(
            expand_windows_user_environment_variables("%TEMP%", &kb, bob, alice),
            "%TEMP%"
        );
    }

    #[test]
    fn user_variant_leaves_missing_fields_and_users_untouched() {
        let kb = windows_kb();
        assert_eq!(
            expand_windows_user_environment_variables("%AppData%", &kb, None, Some("bob")),
            "%AppData%"
        );
        assert_eq!(
            expand_windows_user_environment_variables("%AppData%", &kb, Some("S-1-0-0"), None),
            "%AppData%"
        );
        assert_eq!(
            expand_windows_user_environment_variables("%SystemRoot%", &kb, None, Some("alice")),
            "%SystemRoot%"
        );
    }

    #[test]
    fn map_applies_aliases() {
        let kb = windows_kb();
        let map = windows_environment_variables_map(&kb);
        assert_eq!(map["programfiles"].as_single(), Some("C:\\Program Files"));
        assert_eq!(map["programw6432"].as_single(), Some("C:\\Program Files"));
        assert_eq!(map["allusersprofile"].as_single(), Some("C:\\ProgramData"));
        assert_eq!(map["programdata"].as_single(), Some("C:\\ProgramData"));
        assert_eq!(map["programfiles(x86)"].as_single(), Some("C:\\Program Files (x86)"));
        assert!(!map.contains_key("temp"));
    }

    #[test]
    fn map_aggregates_user_fields_in_order() {
        let kb = windows_kb();
        let map = windows_environment_variables_map(&kb);
        assert_eq!(
            map["userprofile"].values(),
            vec!["C:\\Users\\alice", "C:\\Users\\bob"]
        );
        assert_eq!(map["appdata"].values(), vec!["C:\\Users\\alice\\AppData\\Roaming"]);
        assert!(!map.contains_key("localappdata"));
        assert!(map["userprofile"].as_single().is_none());
    }

    #[test]
    fn map_serializes_as_string_or_list() {
        let kb = windows_kb();
        let json = serde_json::to_value(windows_environment_variables_map(&kb)).unwrap();
        assert_eq!(json["systemroot"], "C:\\Windows");
        assert_eq!(json["userprofile"][1], "C:\\Users\\bob");
    }
}
