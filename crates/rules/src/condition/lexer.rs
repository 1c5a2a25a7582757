//! Tokenizer for the filter expression language.

use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    /// Bare word: a field path, a keyword, or a word operator.
    Word(String),
    Str(String),
    Number(f64),
    /// Symbolic operator: `==`, `!=`, `<`, `<=`, `>`, `>=`, `&&`, `||`, `!`.
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    /// Byte offset of the token in the source expression.
    pub offset: usize,
}

const SYMBOLS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||", "<", ">", "!"];

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            chars.next();
            tokens.push(Spanned { token, offset });
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let value = read_string(&mut chars, c, offset)?;
            tokens.push(Spanned {
                token: Token::Str(value),
                offset,
            });
            continue;
        }

        let rest = &source[offset..];
        let starts_number = c.is_ascii_digit()
            || (c == '-' && rest[1..].starts_with(|n: char| n.is_ascii_digit()));
        if starts_number {
            let len = rest
                .char_indices()
                .skip(1)
                .find(|&(_, n)| !(n.is_ascii_digit() || n == '.'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let literal = &rest[..len];
            let value = literal.parse::<f64>().map_err(|_| ExpressionError::Syntax {
                offset,
                message: format!("invalid number '{}'", literal),
            })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            advance(&mut chars, offset + len);
            continue;
        }

        if is_word_start(c) {
            let len = rest
                .char_indices()
                .find(|&(_, n)| !is_word_char(n))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            tokens.push(Spanned {
                token: Token::Word(rest[..len].to_string()),
                offset,
            });
            advance(&mut chars, offset + len);
            continue;
        }

        if let Some(symbol) = SYMBOLS.iter().find(|s| rest.starts_with(**s)) {
            tokens.push(Spanned {
                token: Token::Symbol(*symbol),
                offset,
            });
            advance(&mut chars, offset + symbol.len());
            continue;
        }

        return Err(ExpressionError::Syntax {
            offset,
            message: format!("unexpected character '{}'", c),
        });
    }

    Ok(tokens)
}

fn advance(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, until: usize) {
    while chars.peek().is_some_and(|&(i, _)| i < until) {
        chars.next();
    }
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, ExpressionError> {
    let mut value = String::new();
    loop {
        let Some((offset, c)) = chars.next() else {
            return Err(ExpressionError::Syntax {
                offset: start,
                message: "unterminated string literal".to_string(),
            });
        };
        match c {
            c if c == quote => return Ok(value),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(ExpressionError::Syntax {
                        offset,
                        message: "dangling escape at end of input".to_string(),
                    });
                };
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' | '\'' | '"' => value.push(escaped),
                    // Unknown escapes keep the backslash, so regex classes
                    // like `\d` survive inside quoted patterns.
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            other => value.push(other),
        }
    }
}
