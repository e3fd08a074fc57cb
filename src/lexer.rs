//! SQuery lexer.
//!
//! Single pass over the decoded SQuery string. The lexer never fails:
//! unknown characters are skipped with a warning and tokenization
//! continues, matching the forgiving surface the query language exposes
//! to URL authors.

use crate::diagnostics::Diagnostics;

/// SQuery keywords. Matching is case-insensitive; tokens keep the
/// original-case lexeme so a keyword reused as an identifier segment
/// (a column literally named `Type`) survives intact.
const KEYWORDS: &[&str] = &[
    "join", "of", "type", "top", "select", "where", "order", "by", "and", "or", "not", "asc",
    "desc",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Boolean,
    Null,
    Operator,
    LParen,
    RParen,
    Comma,
    Dot,
}

/// One lexed token with its source position (character offset).
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: usize,
}

impl Token {
    /// True for a keyword token with the given (lowercase) name.
    #[inline]
    pub fn is_keyword(&self, name: &str) -> bool {
        self.kind == TokenKind::Keyword && self.lexeme.eq_ignore_ascii_case(name)
    }
}

/// Tokenize a decoded SQuery string.
pub fn tokenize(input: &str, diags: &mut Diagnostics) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Operators, greedy-longest-match: %=% before %= before %.
        if c == '%' {
            if i + 2 < len && chars[i + 1] == '=' && chars[i + 2] == '%' {
                tokens.push(token(TokenKind::Operator, "%=%", i));
                i += 3;
            } else if i + 1 < len && chars[i + 1] == '=' {
                tokens.push(token(TokenKind::Operator, "%=", i));
                i += 2;
            } else {
                tokens.push(token(TokenKind::Operator, "%", i));
                i += 1;
            }
            continue;
        }
        if c == '!' {
            if i + 1 < len && chars[i + 1] == '=' {
                tokens.push(token(TokenKind::Operator, "!=", i));
                i += 2;
            } else {
                // Reserved; a stray `!` is rejected by the parser.
                tokens.push(token(TokenKind::Operator, "!", i));
                i += 1;
            }
            continue;
        }
        if c == '>' || c == '<' {
            if i + 1 < len && chars[i + 1] == '=' {
                tokens.push(token(TokenKind::Operator, &format!("{c}="), i));
                i += 2;
            } else {
                tokens.push(token(TokenKind::Operator, &c.to_string(), i));
                i += 1;
            }
            continue;
        }
        match c {
            '=' => {
                tokens.push(token(TokenKind::Operator, "=", i));
                i += 1;
                continue;
            }
            '(' => {
                tokens.push(token(TokenKind::LParen, "(", i));
                i += 1;
                continue;
            }
            ')' => {
                tokens.push(token(TokenKind::RParen, ")", i));
                i += 1;
                continue;
            }
            ',' => {
                tokens.push(token(TokenKind::Comma, ",", i));
                i += 1;
                continue;
            }
            '.' => {
                tokens.push(token(TokenKind::Dot, ".", i));
                i += 1;
                continue;
            }
            _ => {}
        }

        // A minus sign immediately before a digit starts a signed number.
        if c == '-' && i + 1 < len && chars[i + 1].is_ascii_digit() {
            let (lexeme, next) = read_number(&chars, i + 1);
            tokens.push(token(TokenKind::Number, &format!("-{lexeme}"), i));
            i = next;
            continue;
        }

        if c.is_ascii_digit() {
            let (lexeme, next) = read_number(&chars, i);
            tokens.push(token(TokenKind::Number, &lexeme, i));
            i = next;
            continue;
        }

        // String literals: single or double quotes, no escape processing.
        if c == '\'' || c == '"' {
            let start = i;
            let mut value = String::new();
            i += 1;
            while i < len && chars[i] != c {
                value.push(chars[i]);
                i += 1;
            }
            if i < len {
                i += 1; // closing quote
            } else {
                diags.warn(format!(
                    "Unterminated string literal starting at position {start}"
                ));
            }
            tokens.push(Token {
                kind: TokenKind::String,
                lexeme: value,
                pos: start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            let mut lexeme = String::new();
            while i < len && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == ':')
            {
                lexeme.push(chars[i]);
                i += 1;
            }
            // Classification is case-insensitive, but the lexeme keeps its
            // original case: keyword tokens double as identifier segments.
            let lowered = lexeme.to_ascii_lowercase();
            let kind = if lowered == "null" {
                TokenKind::Null
            } else if lowered == "true" || lowered == "false" {
                TokenKind::Boolean
            } else if KEYWORDS.contains(&lowered.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token {
                kind,
                lexeme,
                pos: start,
            });
            continue;
        }

        diags.warn(format!(
            "Skipping unrecognized character '{c}' at position {i}"
        ));
        i += 1;
    }

    tokens
}

/// Read digits with an optional embedded decimal point.
fn read_number(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    let mut lexeme = String::new();
    while i < chars.len() && chars[i].is_ascii_digit() {
        lexeme.push(chars[i]);
        i += 1;
    }
    if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
        lexeme.push('.');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            lexeme.push(chars[i]);
            i += 1;
        }
    }
    (lexeme, i)
}

fn token(kind: TokenKind, lexeme: &str, pos: usize) -> Token {
    Token {
        kind,
        lexeme: lexeme.to_string(),
        pos,
    }
}
