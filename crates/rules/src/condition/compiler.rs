//! Compiles a parsed filter expression into a reusable matcher.

use hostfacts_core::{format_number, Fact, FactRecord};
use regex::{Regex, RegexBuilder};

use super::parser::{Expr, Literal, Operator};
use super::{ExpressionError, Matcher};

/// A single test applied to each value a path resolves to.
#[derive(Debug, Clone)]
enum Test {
    Equal(Literal),
    Less(f64),
    LessEqual(f64),
    Greater(f64),
    GreaterEqual(f64),
    Contains(String),
    InSet(Vec<Literal>),
    Regex(Regex),
    StartsWith(String),
    EndsWith(String),
}

#[derive(Debug, Clone)]
enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
    Test {
        path: Vec<String>,
        test: Test,
        /// Negated operators invert the whole any-value result.
        negate: bool,
    },
}

/// Compiled filter expression, bound to the [`FactRecord`] object model.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    root: Node,
}

impl Matcher for CompiledFilter {
    fn matches(&self, subject: &dyn FactRecord) -> bool {
        eval(&self.root, subject)
    }
}

pub(crate) fn compile(expr: Expr) -> Result<CompiledFilter, ExpressionError> {
    Ok(CompiledFilter {
        root: compile_node(expr)?,
    })
}

fn compile_node(expr: Expr) -> Result<Node, ExpressionError> {
    match expr {
        Expr::And(terms) => Ok(Node::And(
            terms.into_iter().map(compile_node).collect::<Result<_, _>>()?,
        )),
        Expr::Or(terms) => Ok(Node::Or(
            terms.into_iter().map(compile_node).collect::<Result<_, _>>()?,
        )),
        Expr::Not(inner) => Ok(Node::Not(Box::new(compile_node(*inner)?))),
        Expr::Comparison {
            path,
            operator,
            value,
        } => {
            let segments: Vec<String> = path.split('.').map(str::to_string).collect();
            if segments.iter().any(String::is_empty) {
                return Err(ExpressionError::Compile(format!("invalid field path '{}'", path)));
            }
            let (operator, negate) = match operator.positive() {
                Some(positive) => (positive, true),
                None => (operator, false),
            };
            Ok(Node::Test {
                path: segments,
                test: compile_test(&path, operator, value)?,
                negate,
            })
        }
    }
}

fn compile_test(path: &str, operator: Operator, value: Literal) -> Result<Test, ExpressionError> {
    let mismatch = |expected: &str| {
        ExpressionError::Compile(format!(
            "operator '{}' on '{}' expects {}",
            operator, path, expected
        ))
    };

    let test = match (operator, value) {
        (Operator::InSet, Literal::List(items)) => Test::InSet(items),
        (Operator::InSet, _) => return Err(mismatch("a list")),
        (_, Literal::List(_)) => return Err(mismatch("a single value, not a list")),

        (Operator::Equal, literal) => Test::Equal(literal),

        (Operator::Less, Literal::Number(n)) => Test::Less(n),
        (Operator::LessEqual, Literal::Number(n)) => Test::LessEqual(n),
        (Operator::Greater, Literal::Number(n)) => Test::Greater(n),
        (Operator::GreaterEqual, Literal::Number(n)) => Test::GreaterEqual(n),
        (Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual, _) => {
            return Err(mismatch("a number"));
        }

        (Operator::Contains, Literal::Str(s)) => Test::Contains(s),
        (Operator::Contains, Literal::Number(n)) => Test::Contains(format_number(n)),
        (Operator::StartsWith, Literal::Str(s)) => Test::StartsWith(s),
        (Operator::EndsWith, Literal::Str(s)) => Test::EndsWith(s),
        (Operator::Contains | Operator::StartsWith | Operator::EndsWith, _) => {
            return Err(mismatch("a string"));
        }

        (Operator::Regexp | Operator::IRegexp, Literal::Str(pattern)) => {
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(operator == Operator::IRegexp)
                .build()
                .map_err(|e| {
                    ExpressionError::Compile(format!(
                        "invalid regular expression '{}': {}",
                        pattern, e
                    ))
                })?;
            Test::Regex(regex)
        }
        (Operator::Regexp | Operator::IRegexp, _) => return Err(mismatch("a string pattern")),

        // Negated operators were folded into their positive form above.
        (Operator::NotEqual | Operator::NotContains | Operator::NotInSet, _) => {
            return Err(ExpressionError::Compile(format!(
                "operator '{}' cannot be compiled directly",
                operator
            )));
        }
    };
    Ok(test)
}

// ── Evaluation ──────────────────────────────────────────────────────

fn eval(node: &Node, subject: &dyn FactRecord) -> bool {
    match node {
        Node::And(terms) => terms.iter().all(|t| eval(t, subject)),
        Node::Or(terms) => terms.iter().any(|t| eval(t, subject)),
        Node::Not(inner) => !eval(inner, subject),
        Node::Test { path, test, negate } => {
            let mut values = Vec::new();
            collect_values(subject, path, &mut values);
            let hit = values.iter().any(|v| test_value(test, v));
            hit != *negate
        }
    }
}

/// Walk `path` from `record`, fanning out over repeated records.
fn collect_values<'a>(record: &'a dyn FactRecord, path: &[String], out: &mut Vec<Fact<'a>>) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    match record.fact(head) {
        Some(Fact::Records(records)) if !rest.is_empty() => {
            for child in records {
                collect_values(child, rest, out);
            }
        }
        Some(fact) if rest.is_empty() => out.push(fact),
        _ => {}
    }
}

fn numeric(value: &Fact<'_>) -> Option<f64> {
    match value {
        Fact::Number(n) => Some(*n),
        Fact::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn literal_equals(literal: &Literal, value: &Fact<'_>) -> bool {
    match (literal, value) {
        (Literal::Str(l), Fact::Text(v)) => l == v,
        (Literal::Str(l), Fact::Number(n)) => l.trim().parse::<f64>().is_ok_and(|l| l == *n),
        (Literal::Number(l), v) => numeric(v).is_some_and(|n| n == *l),
        (Literal::Bool(l), Fact::Bool(b)) => l == b,
        (Literal::Bool(l), Fact::Text(v)) => {
            v.eq_ignore_ascii_case(if *l { "true" } else { "false" })
        }
        (Literal::List(items), v) => items.iter().any(|item| literal_equals(item, v)),
        _ => false,
    }
}

fn test_value(test: &Test, value: &Fact<'_>) -> bool {
    match test {
        Test::Equal(literal) => literal_equals(literal, value),
        Test::Less(n) => numeric(value).is_some_and(|v| v < *n),
        Test::LessEqual(n) => numeric(value).is_some_and(|v| v <= *n),
        Test::Greater(n) => numeric(value).is_some_and(|v| v > *n),
        Test::GreaterEqual(n) => numeric(value).is_some_and(|v| v >= *n),
        Test::InSet(items) => items.iter().any(|item| literal_equals(item, value)),
        Test::Contains(needle) => value.as_text().is_some_and(|v| v.contains(needle.as_str())),
        Test::StartsWith(prefix) => value.as_text().is_some_and(|v| v.starts_with(prefix.as_str())),
        Test::EndsWith(suffix) => value.as_text().is_some_and(|v| v.ends_with(suffix.as_str())),
        Test::Regex(regex) => value
            .to_scalar_string()
            .is_some_and(|v| regex.is_match(&v)),
    }
}
