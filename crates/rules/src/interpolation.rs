//! Knowledge-base driven pattern interpolation.
//!
//! Expands `%%name%%` and `%%group.field%%` placeholders into every concrete
//! string the knowledge base implies. A repeated group (e.g. `users`)
//! contributes one alternative per record that has the field, so
//! `/home/%%users.username%%` yields one path per user. Several
//! placeholders combine as a Cartesian product.

use std::sync::OnceLock;

use hostfacts_core::{Fact, FactRecord};
use indexmap::IndexSet;
use regex::Regex;
use tracing::info;

const INTERPOLATED_PATTERN: &str = r"%%([^%]+?)%%";

static INTERPOLATED_REGEX: OnceLock<Regex> = OnceLock::new();

fn interpolated_regex() -> &'static Regex {
    INTERPOLATED_REGEX
        .get_or_init(|| Regex::new(INTERPOLATED_PATTERN).expect("invalid interpolation regex"))
}

/// A pattern referenced a fact the knowledge base does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to interpolate '{pattern}' with the knowledge base: missing '{token}'")]
pub struct InterpolationError {
    pub pattern: String,
    /// Lower-cased name of the fact (or `group.field`) that could not be resolved.
    pub token: String,
}

/// Outcome of interpolating one pattern.
#[derive(Debug, Clone)]
pub enum Interpolation {
    /// Every placeholder resolved; iterate to get the expansions.
    Expanded(Expansion),
    /// A placeholder could not be resolved and errors were ignored.
    /// The pattern contributes nothing.
    Skipped { pattern: String, token: String },
}

impl Interpolation {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Interpolation::Skipped { .. })
    }
}

impl IntoIterator for Interpolation {
    type Item = String;
    type IntoIter = Expansion;

    fn into_iter(self) -> Expansion {
        match self {
            Interpolation::Expanded(expansion) => expansion,
            Interpolation::Skipped { .. } => Expansion::empty(),
        }
    }
}

/// Lazy Cartesian product over the literal and alternative groups of a
/// pattern. The last group varies fastest.
#[derive(Debug, Clone)]
pub struct Expansion {
    groups: Vec<Vec<String>>,
    /// Index into each group; `None` once exhausted.
    cursor: Option<Vec<usize>>,
}

impl Expansion {
    fn new(groups: Vec<Vec<String>>) -> Self {
        let cursor = if groups.iter().any(Vec::is_empty) {
            None
        } else {
            Some(vec![0; groups.len()])
        };
        Self { groups, cursor }
    }

    fn empty() -> Self {
        Self {
            groups: Vec::new(),
            cursor: None,
        }
    }

    /// Total number of strings this expansion produces from the start.
    pub fn total(&self) -> usize {
        if self.groups.is_empty() {
            return 0;
        }
        self.groups.iter().map(Vec::len).product()
    }
}

impl Iterator for Expansion {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let cursor = self.cursor.as_mut()?;

        let item: String = self
            .groups
            .iter()
            .zip(cursor.iter())
            .map(|(group, &i)| group[i].as_str())
            .collect();

        let mut exhausted = true;
        for pos in (0..cursor.len()).rev() {
            cursor[pos] += 1;
            if cursor[pos] < self.groups[pos].len() {
                exhausted = false;
                break;
            }
            cursor[pos] = 0;
        }
        if exhausted {
            self.cursor = None;
        }

        Some(item)
    }
}

/// Resolve one placeholder token into its ordered, de-duplicated
/// alternatives. `Err` carries the name that failed to resolve.
fn resolve_token<R>(kb: &R, token: &str) -> Result<IndexSet<String>, String>
where
    R: FactRecord + ?Sized,
{
    let mut alternatives = IndexSet::new();

    if let Some((base, field)) = token.split_once('.') {
        let base = base.to_lowercase();
        match kb.fact(&base) {
            Some(Fact::Records(records)) => {
                // Records lacking the field are skipped; one value is enough.
                for record in records {
                    let value = record.fact(field).and_then(|f| f.to_scalar_string());
                    if let Some(value) = value.filter(|v| !v.is_empty()) {
                        alternatives.insert(value);
                    }
                }
                if alternatives.is_empty() {
                    return Err(token.to_lowercase());
                }
            }
            Some(scalar) => match scalar.to_scalar_string().filter(|v| !v.is_empty()) {
                Some(value) => {
                    alternatives.insert(value);
                }
                None => return Err(base),
            },
            None => return Err(base),
        }
    } else {
        let name = token.to_lowercase();
        match kb.fact(&name).and_then(|f| f.to_scalar_string()) {
            Some(value) if !value.is_empty() => {
                alternatives.insert(value);
            }
            _ => return Err(name),
        }
    }

    Ok(alternatives)
}

/// Interpolate all knowledge base attributes in `pattern`.
///
/// With `ignore_errors` set, an unresolvable placeholder yields
/// [`Interpolation::Skipped`] instead of an error. Either way no partial
/// output is produced for the pattern.
pub fn interpolate_kb_attributes<R>(
    pattern: &str,
    kb: &R,
    ignore_errors: bool,
) -> Result<Interpolation, InterpolationError>
where
    R: FactRecord + ?Sized,
{
    let mut groups = Vec::new();
    let mut offset = 0;

    for caps in interpolated_regex().captures_iter(pattern) {
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        groups.push(vec![pattern[offset..whole.start()].to_string()]);

        match resolve_token(kb, token.as_str()) {
            Ok(alternatives) => groups.push(alternatives.into_iter().collect()),
            Err(missing) if ignore_errors => {
                return Ok(Interpolation::Skipped {
                    pattern: pattern.to_string(),
                    token: missing,
                });
            }
            Err(missing) => {
                return Err(InterpolationError {
                    pattern: pattern.to_string(),
                    token: missing,
                });
            }
        }
        offset = whole.end();
    }

    groups.push(vec![pattern[offset..].to_string()]);
    Ok(Interpolation::Expanded(Expansion::new(groups)))
}

/// Interpolate every pattern and concatenate the results in input order.
///
/// Skipped patterns are logged and contribute nothing; they never stop the
/// remaining patterns from being processed.
pub fn interpolate_list_kb_attributes<R, I, S>(
    patterns: I,
    kb: &R,
    ignore_errors: bool,
) -> Result<Vec<String>, InterpolationError>
where
    R: FactRecord + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut interpolated = Vec::new();
    for pattern in patterns {
        match interpolate_kb_attributes(pattern.as_ref(), kb, ignore_errors)? {
            Interpolation::Expanded(expansion) => interpolated.extend(expansion),
            Interpolation::Skipped { pattern, token } => {
                info!(
                    pattern = %pattern,
                    token = %token,
                    "failed to interpolate pattern with the knowledge base, skipping"
                );
            }
        }
    }
    Ok(interpolated)
}
