//! Per-host fact base consulted by interpolation and condition evaluation.
//!
//! The set of facts is bounded and known ahead of time, so every record
//! exposes its facts through [`FactRecord::fact`], an absent-aware lookup by
//! name. Empty strings and unset numbers read as absent.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Lookup contract ───────────────────────────────────────────

/// A single fact value borrowed from a record.
#[derive(Clone)]
pub enum Fact<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Repeated sub-records, in population order (e.g. `users`).
    Records(Vec<&'a dyn FactRecord>),
}

impl<'a> Fact<'a> {
    /// The text value, if this fact is a plain string.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Fact::Text(s) => Some(*s),
            _ => None,
        }
    }

    /// Scalar rendering used when splicing a fact into a string.
    /// Repeated records have no scalar form.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Fact::Text(s) => Some((*s).to_string()),
            Fact::Number(n) => Some(format_number(*n)),
            Fact::Bool(b) => Some(b.to_string()),
            Fact::Records(_) => None,
        }
    }
}

impl fmt::Debug for Fact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Fact::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Fact::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Fact::Records(r) => write!(f, "Records(<{} records>)", r.len()),
        }
    }
}

/// Integral numbers render without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Anything that exposes named facts: the knowledge base, a user record, or
/// any other record a condition is evaluated against.
///
/// Names are matched case-insensitively.
pub trait FactRecord {
    fn fact(&self, name: &str) -> Option<Fact<'_>>;
}

fn text(value: &str) -> Option<Fact<'_>> {
    if value.is_empty() {
        None
    } else {
        Some(Fact::Text(value))
    }
}

// ── Knowledge base ────────────────────────────────────────────

/// Facts collected from one host.
///
/// Populated before any interpolation or condition evaluation runs and
/// treated as read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBase {
    pub hostname: String,
    pub fqdn: String,
    pub os: String,
    pub os_release: String,
    pub os_major_version: Option<u32>,
    pub os_minor_version: Option<u32>,
    pub time_zone: String,
    pub domain: String,

    pub environ_path: String,
    pub environ_temp: String,
    pub environ_systemroot: String,
    pub environ_windir: String,
    pub environ_programfiles: String,
    pub environ_programfilesx86: String,
    pub environ_systemdrive: String,
    pub environ_allusersprofile: String,
    pub environ_allusersappdata: String,
    pub environ_comspec: String,
    pub environ_profilesdirectory: String,

    pub users: Vec<User>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    fn scalar(&self, name: &str) -> Option<&String> {
        let value = match name {
            "hostname" => &self.hostname,
            "fqdn" => &self.fqdn,
            "os" => &self.os,
            "os_release" => &self.os_release,
            "time_zone" => &self.time_zone,
            "domain" => &self.domain,
            "environ_path" => &self.environ_path,
            "environ_temp" => &self.environ_temp,
            "environ_systemroot" => &self.environ_systemroot,
            "environ_windir" => &self.environ_windir,
            "environ_programfiles" => &self.environ_programfiles,
            "environ_programfilesx86" | "environ_programfiles(x86)" => {
                &self.environ_programfilesx86
            }
            "environ_systemdrive" => &self.environ_systemdrive,
            "environ_allusersprofile" => &self.environ_allusersprofile,
            "environ_allusersappdata" => &self.environ_allusersappdata,
            "environ_comspec" => &self.environ_comspec,
            "environ_profilesdirectory" => &self.environ_profilesdirectory,
            _ => return None,
        };
        Some(value)
    }

    /// Case-insensitive scalar lookup. Returns `None` for unset, empty, or
    /// unknown facts.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.scalar(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Append a user record, preserving population order.
    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Select one user. A SID, when given, is authoritative: only a user with
    /// that SID matches, and the username is ignored. Otherwise the first user
    /// with the given username matches. Empty selectors count as not given.
    pub fn user(&self, sid: Option<&str>, username: Option<&str>) -> Option<&User> {
        if let Some(sid) = sid.filter(|s| !s.is_empty()) {
            return self.users.iter().find(|user| user.sid == sid);
        }
        let username = username.filter(|n| !n.is_empty())?;
        self.users.iter().find(|user| user.username == username)
    }

    pub fn os_family(&self) -> Option<&str> {
        self.get("os")
    }
}

impl FactRecord for KnowledgeBase {
    fn fact(&self, name: &str) -> Option<Fact<'_>> {
        let key = name.to_ascii_lowercase();
        match key.as_str() {
            "users" => {
                if self.users.is_empty() {
                    None
                } else {
                    Some(Fact::Records(
                        self.users.iter().map(|u| u as &dyn FactRecord).collect(),
                    ))
                }
            }
            "os_major_version" => self.os_major_version.map(|v| Fact::Number(f64::from(v))),
            "os_minor_version" => self.os_minor_version.map(|v| Fact::Number(f64::from(v))),
            other => self.scalar(other).and_then(|v| text(v)),
        }
    }
}

// ── User ──────────────────────────────────────────────────────

/// One account on the host. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub full_name: String,
    pub sid: String,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub homedir: String,
    pub shell: String,
    pub shell_history: String,
    pub userdomain: String,
    pub userprofile: String,
    pub appdata: String,
    pub localappdata: String,
    pub temp: String,
    pub desktop: String,
    pub personal: String,
    pub startup: String,
    pub recent: String,
    pub cookies: String,
    pub internet_cache: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    fn field(&self, name: &str) -> Option<&String> {
        let value = match name {
            "username" => &self.username,
            "full_name" => &self.full_name,
            "sid" => &self.sid,
            "homedir" => &self.homedir,
            "shell" => &self.shell,
            "shell_history" => &self.shell_history,
            "userdomain" => &self.userdomain,
            "userprofile" => &self.userprofile,
            "appdata" => &self.appdata,
            "localappdata" => &self.localappdata,
            "temp" => &self.temp,
            "desktop" => &self.desktop,
            "personal" => &self.personal,
            "startup" => &self.startup,
            "recent" => &self.recent,
            "cookies" => &self.cookies,
            "internet_cache" => &self.internet_cache,
            _ => return None,
        };
        Some(value)
    }

    /// Case-insensitive text field lookup; empty reads as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.field(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl FactRecord for User {
    fn fact(&self, name: &str) -> Option<Fact<'_>> {
        let key = name.to_ascii_lowercase();
        match key.as_str() {
            "uid" => self.uid.map(|v| Fact::Number(f64::from(v))),
            "gid" => self.gid.map(|v| Fact::Number(f64::from(v))),
            other => self.field(other).and_then(|v| text(v)),
        }
    }
}
