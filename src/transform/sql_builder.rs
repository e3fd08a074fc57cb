//! SQL statement builder.
//!
//! Accumulates the pieces of one SELECT statement (select list, FROM,
//! JOIN fragments, WHERE, ORDER BY, TOP, paging) plus the parameter
//! table, then assembles the final text. Values are first parameterized
//! as `@pN` placeholders; [`SqlBuilder::build_inlined`] substitutes the
//! literals afterwards, longest key first, so all literal escaping lives
//! in one formatter.

use indexmap::IndexMap;

use crate::ast::Value;
use crate::util::escape_string_literal;

#[derive(Debug, Default)]
pub struct SqlBuilder {
    select: Vec<String>,
    from_table: String,
    from_alias: String,
    joins: Vec<String>,
    where_clause: Option<String>,
    order_by: Vec<String>,
    top: i64,
    offset: i64,
    limit: i64,
    /// `@pN` → value, in creation order.
    parameters: IndexMap<String, Value>,
    param_counter: usize,
    /// alias → entity, populated incrementally as joins resolve.
    alias_entities: IndexMap<String, String>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_from(&mut self, table: impl Into<String>, alias: impl Into<String>) {
        self.from_table = table.into();
        self.from_alias = alias.into();
    }

    pub fn bind_alias(&mut self, alias: impl Into<String>, entity: impl Into<String>) {
        self.alias_entities.insert(alias.into(), entity.into());
    }

    pub fn alias_entity(&self, alias: &str) -> Option<&str> {
        self.alias_entities.get(alias).map(String::as_str)
    }

    pub fn from_alias(&self) -> &str {
        &self.from_alias
    }

    pub fn push_select(&mut self, field: impl Into<String>) {
        self.select.push(field.into());
    }

    pub fn push_join(&mut self, join: impl Into<String>) {
        self.joins.push(join.into());
    }

    pub fn set_where(&mut self, clause: impl Into<String>) {
        self.where_clause = Some(clause.into());
    }

    pub fn push_order_by(&mut self, item: impl Into<String>) {
        self.order_by.push(item.into());
    }

    pub fn set_top(&mut self, top: i64) {
        self.top = top;
    }

    pub fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    pub fn set_limit(&mut self, limit: i64) {
        self.limit = limit;
    }

    /// Register a value and return its `@pN` placeholder. Parameter names
    /// are unique and contiguous from `p1`.
    pub fn add_parameter(&mut self, value: Value) -> String {
        self.param_counter += 1;
        let placeholder = format!("@p{}", self.param_counter);
        self.parameters.insert(placeholder.clone(), value);
        placeholder
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    pub fn into_parameters(self) -> IndexMap<String, Value> {
        self.parameters
    }

    /// Assemble the statement with `@pN` placeholders still in place.
    pub fn build(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let mut select = String::from("SELECT ");
        if self.top > 0 {
            select.push_str(&format!("TOP {} ", self.top));
        }
        if self.select.is_empty() {
            select.push('*');
        } else {
            select.push_str(&self.select.join(", "));
        }
        parts.push(select);

        parts.push(format!("FROM {} {}", self.from_table, self.from_alias));
        parts.extend(self.joins.iter().cloned());

        if let Some(where_clause) = &self.where_clause {
            parts.push(format!("WHERE {where_clause}"));
        }

        let paging = self.top <= 0 && (self.offset > 0 || self.limit > 0);
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.join(", ")));
        } else if paging {
            // SQL Server requires ORDER BY for OFFSET/FETCH.
            parts.push("ORDER BY (SELECT NULL)".to_string());
        }

        if paging {
            parts.push(format!("OFFSET {} ROWS", self.offset.max(0)));
            if self.limit > 0 {
                parts.push(format!("FETCH NEXT {} ROWS ONLY", self.limit));
            }
        }

        parts.join(" ")
    }

    /// Assemble the statement and inline every parameter as a SQL literal.
    ///
    /// Substitution is longest-key-first so `@p10` is never shadowed by
    /// `@p1`.
    pub fn build_inlined(&self) -> String {
        let mut sql = self.build();
        let mut keys: Vec<&String> = self.parameters.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
        for key in keys {
            let literal = format_literal(&self.parameters[key.as_str()]);
            sql = sql.replace(key.as_str(), &literal);
        }
        sql
    }
}

/// Format a value as a SQL Server literal.
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("'{}'", escape_string_literal(s)),
    }
}
