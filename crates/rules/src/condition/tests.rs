//! Tests for condition parsing, compilation and matching.

use hostfacts_core::{Fact, FactRecord, KnowledgeBase, User};

use super::*;

fn linux_kb() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new();
    kb.os = "Linux".to_string();
    kb.os_release = "Ubuntu".to_string();
    kb.os_major_version = Some(22);
    kb.os_minor_version = Some(4);
    kb.fqdn = "web01.prod.example.com".to_string();
    kb.add_user(User {
        username: "root".to_string(),
        uid: Some(0),
        homedir: "/root".to_string(),
        shell: "/bin/bash".to_string(),
        ..User::default()
    });
    kb.add_user(User {
        username: "user1".to_string(),
        uid: Some(1000),
        homedir: "/home/user1".to_string(),
        shell: "/usr/bin/zsh".to_string(),
        ..User::default()
    });
    kb
}

fn check(expression: &str, kb: &KnowledgeBase) -> bool {
    check_condition(expression, kb).unwrap()
}

#[test]
fn os_equality() {
    let kb = linux_kb();
    assert!(check("os == 'Linux'", &kb));
    assert!(!check("os == 'Windows'", &kb));

    let mut windows = KnowledgeBase::new();
    windows.os = "Windows".to_string();
    assert!(!check("os == 'Linux'", &windows));
    assert!(check("os == 'Windows'", &windows));
}

#[test]
fn equality_is_case_sensitive_on_values_but_not_paths() {
    let kb = linux_kb();
    assert!(!check("os == 'linux'", &kb));
    assert!(check("OS == 'Linux'", &kb));
    assert!(check("os iregexp '^linux$'", &kb));
}

#[test]
fn incomplete_expression_is_a_condition_error() {
    let kb = linux_kb();
    let err = check_condition("os == ", &kb).unwrap_err();
    assert_eq!(err.condition, "os == ");
    assert!(matches!(err.source, ExpressionError::Syntax { .. }));
    assert!(err.to_string().contains("os == "));
}

#[test]
fn deeply_nested_expression_is_a_condition_error() {
    let kb = linux_kb();
    let expression = format!("{}os == 'Linux'", "not ".repeat(200_000));
    let err = check_condition(&expression, &kb).unwrap_err();
    assert!(matches!(
        err.source,
        ExpressionError::Syntax { ref message, .. } if message.contains("nested too deeply")
    ));

    // Even nesting within the limit still evaluates.
    assert!(check("not not (os == 'Linux')", &kb));
}

#[test]
fn compile_errors_are_condition_errors() {
    let kb = linux_kb();
    for expression in [
        "os_major_version > 'ten'",
        "os inset 'Linux'",
        "os == ['Linux']",
        "os regexp '('",
        "users..username == 'x'",
        "os contains true",
    ] {
        let err = check_condition(expression, &kb).unwrap_err();
        assert!(
            matches!(err.source, ExpressionError::Compile(_)),
            "expected compile error for {:?}, got {:?}",
            expression,
            err
        );
    }
}

#[test]
fn numeric_comparisons() {
    let kb = linux_kb();
    assert!(check("os_major_version >= 22", &kb));
    assert!(check("os_major_version > 20 and os_minor_version < 10", &kb));
    assert!(!check("os_major_version < 22", &kb));
    assert!(check("os_major_version == 22", &kb));
    assert!(check("os_major_version == '22'", &kb));
}

#[test]
fn missing_fact_never_satisfies_positive_tests() {
    let kb = linux_kb();
    assert!(!check("environ_systemroot == 'C:\\\\Windows'", &kb));
    assert!(!check("time_zone contains 'UTC'", &kb));
    assert!(check("time_zone != 'UTC'", &kb));
}

#[test]
fn repeated_fields_match_any_record() {
    let kb = linux_kb();
    assert!(check("users.username == 'user1'", &kb));
    assert!(check("users.uid == 0", &kb));
    assert!(check("users.shell endswith 'zsh'", &kb));
    assert!(!check("users.username == 'nobody'", &kb));
}

#[test]
fn negated_operators_require_no_record_to_match() {
    let kb = linux_kb();
    assert!(!check("users.username != 'root'", &kb));
    assert!(check("users.username != 'nobody'", &kb));
    assert!(check("users.shell notcontains 'fish'", &kb));
    assert!(!check("users.shell notcontains 'bash'", &kb));
}

#[test]
fn set_membership() {
    let kb = linux_kb();
    assert!(check("os inset ['Linux', 'Darwin']", &kb));
    assert!(!check("os notinset ['Linux', 'Darwin']", &kb));
    assert!(check("os_major_version inset [20, 22]", &kb));
    assert!(!check("os inset []", &kb));
}

#[test]
fn string_operators() {
    let kb = linux_kb();
    assert!(check("fqdn contains 'prod'", &kb));
    assert!(check("fqdn startswith 'web'", &kb));
    assert!(check("fqdn endswith '.example.com'", &kb));
    assert!(check("fqdn regexp '^web\\d+\\.'", &kb));
    assert!(!check("fqdn regexp '^db'", &kb));
}

#[test]
fn numeric_literals_render_like_fact_scalars() {
    let kb = linux_kb();
    assert!(check("fqdn contains 1.0", &kb));
    assert!(!check("fqdn contains 2.5", &kb));
    assert!(check("os_major_version regexp '^22$'", &kb));
}

#[test]
fn boolean_composition() {
    let kb = linux_kb();
    assert!(check("os == 'Windows' or os == 'Linux'", &kb));
    assert!(!check("os == 'Windows' and os == 'Linux'", &kb));
    assert!(check("not os == 'Windows'", &kb));
    assert!(check(
        "(os == 'Windows' || os_release == 'Ubuntu') && !(fqdn contains 'staging')",
        &kb
    ));
}

#[test]
fn compiled_matcher_is_reusable() {
    let matcher = compile_condition("os == 'Linux'").unwrap();
    let linux = linux_kb();
    let empty = KnowledgeBase::new();
    assert!(matcher.matches(&linux));
    assert!(!matcher.matches(&empty));
    assert!(matcher.matches(&linux));
}

#[test]
fn conditions_apply_to_any_fact_record() {
    let user = User {
        username: "svc".to_string(),
        shell: "/usr/sbin/nologin".to_string(),
        ..User::default()
    };
    assert!(check_condition("shell endswith 'nologin'", &user).unwrap());
    assert!(!check_condition("username == 'root'", &user).unwrap());
}

/// A record type defined outside the knowledge base.
struct Package {
    name: &'static str,
    installed: bool,
}

impl FactRecord for Package {
    fn fact(&self, name: &str) -> Option<Fact<'_>> {
        match name.to_ascii_lowercase().as_str() {
            "name" => Some(Fact::Text(self.name)),
            "installed" => Some(Fact::Bool(self.installed)),
            _ => None,
        }
    }
}

#[test]
fn boolean_facts() {
    let package = Package {
        name: "openssh-server",
        installed: true,
    };
    assert!(check_condition("installed == true and name == 'openssh-server'", &package).unwrap());
    assert!(!check_condition("installed == false", &package).unwrap());
}

/// Language that only understands the literal expression `always`.
struct AlwaysLanguage;

struct Always;

impl Matcher for Always {
    fn matches(&self, _subject: &dyn FactRecord) -> bool {
        true
    }
}

impl ExpressionLanguage for AlwaysLanguage {
    type Expr = ();
    type Matcher = Always;

    fn parse(&self, expression: &str) -> Result<(), ExpressionError> {
        if expression == "always" {
            Ok(())
        } else {
            Err(ExpressionError::Syntax {
                offset: 0,
                message: "only 'always' is supported".to_string(),
            })
        }
    }

    fn compile(&self, _expr: ()) -> Result<Always, ExpressionError> {
        Ok(Always)
    }
}

#[test]
fn language_is_swappable() {
    let kb = KnowledgeBase::new();
    assert!(check_condition_with(&AlwaysLanguage, "always", &kb).unwrap());
    let err = check_condition_with(&AlwaysLanguage, "os == 'Linux'", &kb).unwrap_err();
    assert_eq!(err.condition, "os == 'Linux'");
}
