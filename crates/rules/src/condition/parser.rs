//! Recursive-descent parser producing the filter expression tree.
//!
//! ```text
//! expr       := or
//! or         := and (("or" | "||") and)*
//! and        := unary (("and" | "&&") unary)*
//! unary      := ("not" | "!") unary | "(" expr ")" | comparison
//! comparison := path operator literal
//! literal    := string | number | "true" | "false" | "[" literal ("," literal)* "]"
//! ```

use std::fmt;

use super::lexer::{tokenize, Spanned, Token};
use super::ExpressionError;

/// Comparison operators understood by the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Contains,
    NotContains,
    InSet,
    NotInSet,
    Regexp,
    IRegexp,
    StartsWith,
    EndsWith,
}

impl Operator {
    fn from_word(word: &str) -> Option<Self> {
        let op = match word.to_ascii_lowercase().as_str() {
            "is" | "equals" => Operator::Equal,
            "isnot" | "notequals" => Operator::NotEqual,
            "contains" => Operator::Contains,
            "notcontains" => Operator::NotContains,
            "inset" => Operator::InSet,
            "notinset" => Operator::NotInSet,
            "regexp" => Operator::Regexp,
            "iregexp" => Operator::IRegexp,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            _ => return None,
        };
        Some(op)
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterEqual,
            _ => return None,
        };
        Some(op)
    }

    /// For negated operators, the positive operator they invert.
    pub fn positive(self) -> Option<Self> {
        match self {
            Operator::NotEqual => Some(Operator::Equal),
            Operator::NotContains => Some(Operator::Contains),
            Operator::NotInSet => Some(Operator::InSet),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Contains => "contains",
            Operator::NotContains => "notcontains",
            Operator::InSet => "inset",
            Operator::NotInSet => "notinset",
            Operator::Regexp => "regexp",
            Operator::IRegexp => "iregexp",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
        };
        f.write_str(s)
    }
}

/// Literal operand on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
    Bool(bool),
    List(Vec<Literal>),
}

/// Parsed, not yet compiled, filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Comparison {
        /// Dotted field path, e.g. `users.username`.
        path: String,
        operator: Operator,
        value: Literal,
    },
}

/// Maximum nesting of `not` and parentheses.
pub(crate) const MAX_NESTING: usize = 64;

const KEYWORDS: &[&str] = &["and", "or", "not", "true", "false"];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Offset reported for errors at end of input.
    end: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            end: source.len(),
            depth: 0,
        })
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ExpressionError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_or()?;
        if self.peek().is_some() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(self.end)
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        let found = match self.peek() {
            Some(token) => describe(token),
            None => "end of input".to_string(),
        };
        ExpressionError::Syntax {
            offset: self.offset(),
            message: format!("{} (found {})", message.into(), found),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it is the given keyword or symbol.
    fn eat_connective(&mut self, word: &str, symbol: &str) -> bool {
        let hit = match self.peek() {
            Some(Token::Word(w)) => w.eq_ignore_ascii_case(word),
            Some(Token::Symbol(s)) => *s == symbol,
            _ => false,
        };
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut terms = vec![self.parse_and()?];
        while self.eat_connective("or", "||") {
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat_connective("and", "&&") {
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_connective("not", "!") {
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            self.enter()?;
            let inner = self.parse_or()?;
            if self.peek() != Some(&Token::RParen) {
                return Err(self.error("expected ')'"));
            }
            self.pos += 1;
            self.depth -= 1;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    /// Bounds recursion here and in the compiler and evaluator, which walk
    /// the same tree.
    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let path = match self.peek() {
            Some(Token::Word(w)) if !is_keyword(w) && Operator::from_word(w).is_none() => w.clone(),
            _ => return Err(self.error("expected a field name")),
        };
        self.pos += 1;

        let operator = match self.peek() {
            Some(Token::Word(w)) => Operator::from_word(w),
            Some(Token::Symbol(s)) => Operator::from_symbol(s),
            _ => None,
        };
        let Some(operator) = operator else {
            return Err(self.error(format!("expected an operator after '{}'", path)));
        };
        self.pos += 1;

        let value = self.parse_literal()?;
        Ok(Expr::Comparison {
            path,
            operator,
            value,
        })
    }

    fn parse_literal(&mut self) -> Result<Literal, ExpressionError> {
        match self.peek() {
            Some(Token::Str(_)) | Some(Token::Number(_)) => match self.next() {
                Some(Token::Str(s)) => Ok(Literal::Str(s)),
                Some(Token::Number(n)) => Ok(Literal::Number(n)),
                _ => Err(self.error("expected a value")),
            },
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("true") => {
                self.pos += 1;
                Ok(Literal::Bool(true))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("false") => {
                self.pos += 1;
                Ok(Literal::Bool(false))
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut items = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.pos += 1;
                    return Ok(Literal::List(items));
                }
                loop {
                    items.push(self.parse_literal()?);
                    match self.peek() {
                        Some(Token::Comma) => self.pos += 1,
                        Some(Token::RBracket) => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.error("expected ',' or ']' in list")),
                    }
                }
                Ok(Literal::List(items))
            }
            _ => Err(self.error("expected a value")),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Word(w) => format!("'{}'", w),
        Token::Str(s) => format!("string '{}'", s),
        Token::Number(n) => format!("number {}", n),
        Token::Symbol(s) => format!("'{}'", s),
    }
}
