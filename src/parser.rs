//! Recursive-descent parser for SQuery.
//!
//! The parser is non-backtracking: each production either consumes the
//! tokens it expects or raises a fatal [`TranslateError::ParseError`]
//! naming the source position. Unknown top-level keywords are skipped
//! with a warning so that newer query surface features degrade gracefully
//! on older translators.

use crate::ast::{CompareOp, Join, LogicalOp, Query, Sort, Value, WhereExpr};
use crate::diagnostics::Diagnostics;
use crate::error::TranslateError;
use crate::lexer::{self, Token, TokenKind};

pub struct SqueryParser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl SqueryParser {
    /// Lex and parse a decoded SQuery string into a [`Query`].
    pub fn parse(
        squery: &str,
        root_entity: &str,
        diags: &mut Diagnostics,
    ) -> Result<Query, TranslateError> {
        let tokens = lexer::tokenize(squery, diags);
        let mut parser = Self {
            tokens,
            pos: 0,
            input_len: squery.chars().count(),
        };
        parser.parse_query(root_entity, diags)
    }

    fn parse_query(
        &mut self,
        root_entity: &str,
        diags: &mut Diagnostics,
    ) -> Result<Query, TranslateError> {
        let mut query = Query {
            root_entity: root_entity.to_string(),
            ..Default::default()
        };

        while let Some(tok) = self.current() {
            if tok.kind == TokenKind::Keyword {
                match tok.lexeme.to_ascii_lowercase().as_str() {
                    "join" => {
                        self.advance();
                        let join = self.parse_join()?;
                        query.joins.push(join);
                    }
                    "top" => {
                        self.advance();
                        query.top = self.parse_top()?;
                    }
                    "select" => {
                        self.advance();
                        query.select = self.parse_field_list()?;
                    }
                    "where" => {
                        self.advance();
                        query.where_expr = Some(self.parse_or(diags)?);
                    }
                    "order" => {
                        self.advance();
                        self.expect_keyword("by")?;
                        query.order_by = self.parse_order_list()?;
                    }
                    _ => {
                        diags.warn(format!(
                            "Skipping unknown keyword '{}' at position {}",
                            tok.lexeme, tok.pos
                        ));
                        self.advance();
                    }
                }
            } else {
                diags.warn(format!(
                    "Skipping unexpected token '{}' at position {}",
                    tok.lexeme, tok.pos
                ));
                self.advance();
            }
        }

        Ok(query)
    }

    // ========================================================================
    // Clause productions
    // ========================================================================

    /// `join EntityPath [of type TypeFilter] alias`
    fn parse_join(&mut self) -> Result<Join, TranslateError> {
        let path = self.parse_dotted_identifier("join entity path")?;

        let mut type_filter = None;
        if self.check_keyword("of") {
            self.advance();
            self.expect_keyword("type")?;
            type_filter = Some(self.parse_dotted_identifier("join type filter")?);
        }

        // Alias is a single identifier; keyword tokens are accepted as a
        // convenience for aliases like `type`.
        let alias = match self.current() {
            Some(tok) if matches!(tok.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                let alias = tok.lexeme.clone();
                self.advance();
                alias
            }
            _ => return Err(self.error_here(format!("join '{path}' is missing an alias"))),
        };

        Ok(Join {
            path,
            type_filter,
            alias,
        })
    }

    /// `top NUMBER`
    fn parse_top(&mut self) -> Result<i64, TranslateError> {
        match self.current() {
            Some(tok) if tok.kind == TokenKind::Number => {
                // Culture-invariant parse; a fractional top is truncated.
                let value = tok
                    .lexeme
                    .parse::<f64>()
                    .map_err(|_| self.error_at(tok.pos, "invalid number after 'top'"))?;
                self.advance();
                Ok(value as i64)
            }
            _ => Err(self.error_here("expected a number after 'top'")),
        }
    }

    /// `field (, field)*` with a trailing comma tolerated.
    fn parse_field_list(&mut self) -> Result<Vec<String>, TranslateError> {
        let mut fields = Vec::new();
        loop {
            match self.current() {
                Some(tok) if tok.kind == TokenKind::Identifier => {
                    fields.push(self.parse_dotted_identifier("select field")?);
                }
                _ => break,
            }
            if self.check_kind(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(fields)
    }

    /// `order by field [asc|desc] (, field [asc|desc])*`
    fn parse_order_list(&mut self) -> Result<Vec<Sort>, TranslateError> {
        let mut sorts = Vec::new();
        loop {
            match self.current() {
                Some(tok) if tok.kind == TokenKind::Identifier => {
                    let field = self.parse_dotted_identifier("order by field")?;
                    let mut descending = false;
                    if self.check_keyword("asc") {
                        self.advance();
                    } else if self.check_keyword("desc") {
                        self.advance();
                        descending = true;
                    }
                    sorts.push(Sort { field, descending });
                }
                _ if sorts.is_empty() => {
                    return Err(self.error_here("expected a field after 'order by'"));
                }
                _ => break,
            }
            if self.check_kind(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(sorts)
    }

    // ========================================================================
    // WHERE expression grammar (precedence: or < and < not < primary)
    // ========================================================================

    fn parse_or(&mut self, diags: &mut Diagnostics) -> Result<WhereExpr, TranslateError> {
        let mut left = self.parse_and(diags)?;
        while self.check_keyword("or") {
            self.advance();
            let right = self.parse_and(diags)?;
            left = WhereExpr::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self, diags: &mut Diagnostics) -> Result<WhereExpr, TranslateError> {
        let mut left = self.parse_not(diags)?;
        while self.check_keyword("and") {
            self.advance();
            let right = self.parse_not(diags)?;
            left = WhereExpr::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self, diags: &mut Diagnostics) -> Result<WhereExpr, TranslateError> {
        if self.check_keyword("not") {
            self.advance();
            let child = self.parse_not(diags)?;
            return Ok(WhereExpr::Not(Box::new(child)));
        }
        self.parse_primary(diags)
    }

    fn parse_primary(&mut self, diags: &mut Diagnostics) -> Result<WhereExpr, TranslateError> {
        if self.check_kind(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_or(diags)?;
            if self.check_kind(TokenKind::RParen) {
                self.advance();
            } else {
                // Tolerated: treat the current position as the close.
                diags.warn(format!(
                    "Missing ')' in WHERE clause at position {}",
                    self.current_pos()
                ));
            }
            return Ok(expr);
        }
        self.parse_comparison(diags)
    }

    /// `dottedId OPERATOR value`
    fn parse_comparison(&mut self, _diags: &mut Diagnostics) -> Result<WhereExpr, TranslateError> {
        let field = self.parse_dotted_identifier("WHERE field")?;

        let op = match self.current() {
            Some(tok) if tok.kind == TokenKind::Operator => {
                match CompareOp::from_lexeme(&tok.lexeme) {
                    Some(op) => {
                        self.advance();
                        op
                    }
                    None => {
                        return Err(self.error_here(format!(
                            "'{}' is not a comparison operator",
                            tok.lexeme
                        )));
                    }
                }
            }
            _ => {
                return Err(
                    self.error_here(format!("expected a comparison operator after '{field}'"))
                );
            }
        };

        let value = self.parse_value()?;

        Ok(WhereExpr::Compare { field, op, value })
    }

    fn parse_value(&mut self) -> Result<Value, TranslateError> {
        let tok = match self.current() {
            Some(tok) => tok.clone(),
            None => return Err(self.error_here("expected a value")),
        };
        let value = match tok.kind {
            TokenKind::Number => {
                // Integral literals stay exact; only a fractional part
                // forces the float representation.
                if let Ok(n) = tok.lexeme.parse::<i64>() {
                    Value::Int(n)
                } else {
                    let f = tok
                        .lexeme
                        .parse::<f64>()
                        .map_err(|_| self.error_at(tok.pos, "invalid numeric literal"))?;
                    Value::Float(f)
                }
            }
            TokenKind::String => Value::Str(tok.lexeme.clone()),
            TokenKind::Null => Value::Null,
            TokenKind::Boolean => Value::Bool(tok.lexeme.eq_ignore_ascii_case("true")),
            TokenKind::Identifier => Value::Str(tok.lexeme.clone()),
            _ => return Err(self.error_at(tok.pos, format!("'{}' is not a value", tok.lexeme))),
        };
        self.advance();
        Ok(value)
    }

    // ========================================================================
    // Shared productions and token helpers
    // ========================================================================

    /// `id (DOT id)*` — keyword tokens are accepted as identifier parts
    /// after the first position, so field names like `Type` work.
    fn parse_dotted_identifier(&mut self, context: &str) -> Result<String, TranslateError> {
        let mut name = match self.current() {
            Some(tok) if tok.kind == TokenKind::Identifier => {
                let name = tok.lexeme.clone();
                self.advance();
                name
            }
            Some(tok) => {
                return Err(self.error_at(
                    tok.pos,
                    format!("expected an identifier for {context}, found '{}'", tok.lexeme),
                ));
            }
            None => return Err(self.error_here(format!("expected an identifier for {context}"))),
        };

        while self.check_kind(TokenKind::Dot) {
            self.advance();
            match self.current() {
                Some(tok) if matches!(tok.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                    name.push('.');
                    name.push_str(&tok.lexeme);
                    self.advance();
                }
                _ => {
                    return Err(self.error_here(format!("incomplete dotted name in {context}")));
                }
            }
        }

        Ok(name)
    }

    #[inline]
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    #[inline]
    fn check_kind(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    #[inline]
    fn check_keyword(&self, name: &str) -> bool {
        self.current().is_some_and(|t| t.is_keyword(name))
    }

    fn expect_keyword(&mut self, name: &str) -> Result<(), TranslateError> {
        if self.check_keyword(name) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{name}'")))
        }
    }

    fn current_pos(&self) -> usize {
        self.current().map(|t| t.pos).unwrap_or(self.input_len)
    }

    fn error_here(&self, message: impl Into<String>) -> TranslateError {
        self.error_at(self.current_pos(), message)
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> TranslateError {
        TranslateError::ParseError {
            position,
            message: message.into(),
        }
    }
}
