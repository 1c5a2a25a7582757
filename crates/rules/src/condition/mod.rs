//! Condition evaluation over host facts.
//!
//! A condition such as `os == 'Windows' and os_major_version >= 10` decides
//! whether an artifact or check applies to a host. The expression language
//! sits behind [`ExpressionLanguage`] so the grammar can be swapped; the
//! built-in [`FilterLanguage`] supports:
//!
//! - `==` / `is`, `!=` / `isnot`, `<`, `<=`, `>`, `>=`
//! - `contains`, `notcontains`, `startswith`, `endswith`
//! - `inset`, `notinset` (list literal: `['Linux', 'Darwin']`)
//! - `regexp`, `iregexp`
//! - `and` / `&&`, `or` / `||`, `not` / `!`, parentheses
//!
//! Field paths are dotted (`users.username`) and fan out over repeated
//! records: a comparison holds when any resolved value satisfies it, and a
//! negated operator holds when none does.

mod compiler;
mod lexer;
mod parser;

#[cfg(test)]
mod tests;

use hostfacts_core::FactRecord;

pub use compiler::CompiledFilter;
pub use parser::{Expr, Literal, Operator};

/// Errors raised by an expression language while parsing or compiling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("{0}")]
    Compile(String),
}

/// The condition could not be parsed or compiled. The underlying
/// [`ExpressionError`] is kept as the source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid condition '{condition}': {source}")]
pub struct ConditionError {
    pub condition: String,
    #[source]
    pub source: ExpressionError,
}

/// A compiled condition that can be matched against any fact record.
pub trait Matcher {
    fn matches(&self, subject: &dyn FactRecord) -> bool;
}

/// Parse and compile step of an expression language.
pub trait ExpressionLanguage {
    type Expr;
    type Matcher: Matcher;

    fn parse(&self, expression: &str) -> Result<Self::Expr, ExpressionError>;

    fn compile(&self, expr: Self::Expr) -> Result<Self::Matcher, ExpressionError>;
}

/// Built-in filter expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterLanguage;

impl ExpressionLanguage for FilterLanguage {
    type Expr = Expr;
    type Matcher = CompiledFilter;

    fn parse(&self, expression: &str) -> Result<Expr, ExpressionError> {
        parser::Parser::new(expression)?.parse()
    }

    fn compile(&self, expr: Expr) -> Result<CompiledFilter, ExpressionError> {
        compiler::compile(expr)
    }
}

/// Parse and compile `expression` with `language`.
pub fn compile_condition_with<L>(
    language: &L,
    expression: &str,
) -> Result<L::Matcher, ConditionError>
where
    L: ExpressionLanguage + ?Sized,
{
    language
        .parse(expression)
        .and_then(|expr| language.compile(expr))
        .map_err(|source| ConditionError {
            condition: expression.to_string(),
            source,
        })
}

/// Parse and compile `expression` with the built-in filter language.
pub fn compile_condition(expression: &str) -> Result<CompiledFilter, ConditionError> {
    compile_condition_with(&FilterLanguage, expression)
}

/// Check whether `expression` matches `subject` using `language`.
pub fn check_condition_with<L>(
    language: &L,
    expression: &str,
    subject: &dyn FactRecord,
) -> Result<bool, ConditionError>
where
    L: ExpressionLanguage + ?Sized,
{
    Ok(compile_condition_with(language, expression)?.matches(subject))
}

/// Check whether `expression` matches `subject`, e.g.
/// `check_condition("os == 'Windows'", &kb)`.
///
/// Fails with [`ConditionError`] when the expression is malformed or cannot
/// be compiled; an invalid condition is never treated as false.
pub fn check_condition(expression: &str, subject: &dyn FactRecord) -> Result<bool, ConditionError> {
    check_condition_with(&FilterLanguage, expression, subject)
}
