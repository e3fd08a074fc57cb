//! AST for the SQuery language.
//!
//! The tree is deliberately flat: one [`Query`] per translation, a list of
//! [`Join`]s, and a tagged [`WhereExpr`] tree. No node carries behavior
//! beyond cheap accessors; the validator and transformer walk the tree.

/// A parsed SQuery statement.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Root entity name, supplied by the URL preprocessor (not by SQuery text).
    pub root_entity: String,
    /// Joins in source order. Ordering matters: a chained join may only
    /// reference aliases declared earlier.
    pub joins: Vec<Join>,
    /// TOP value; 0 means absent. Signed so that a (malformed) negative
    /// literal survives parsing and is rejected by the validator.
    pub top: i64,
    /// Selected fields, each a possibly dotted identifier.
    pub select: Vec<String>,
    pub where_expr: Option<WhereExpr>,
    pub order_by: Vec<Sort>,
}

impl Query {
    /// True when the SQuery text contributed nothing at all.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
            && self.top == 0
            && self.select.is_empty()
            && self.where_expr.is_none()
            && self.order_by.is_empty()
    }
}

/// A `join` clause: `join EntityPath [of type TypeFilter] alias`.
#[derive(Debug, Clone)]
pub struct Join {
    /// Entity path as written: `NavProp`, `alias.NavProp`, or
    /// `NavProp:TypeName`.
    pub path: String,
    /// Optional `of type` filter. Parsed and carried, not consumed by the
    /// transformer.
    pub type_filter: Option<String>,
    pub alias: String,
}

impl Join {
    /// Parent alias for a chained join (`alias.NavProp`), if any.
    pub fn parent_alias(&self) -> Option<&str> {
        self.path.split_once('.').map(|(parent, _)| parent)
    }

    /// Navigation property name: the path with any chained-alias prefix and
    /// any `:Type` suffix stripped.
    pub fn nav_prop(&self) -> &str {
        let tail = match self.path.split_once('.') {
            Some((_, tail)) => tail,
            None => &self.path,
        };
        match tail.split_once(':') {
            Some((name, _)) => name,
            None => tail,
        }
    }
}

/// A WHERE expression tree.
#[derive(Debug, Clone)]
pub enum WhereExpr {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Logical {
        left: Box<WhereExpr>,
        op: LogicalOp,
        right: Box<WhereExpr>,
    },
    Not(Box<WhereExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Comparison operators of the SQuery surface grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// `%=` — LIKE with the value wrapped in `%…%`.
    Like,
    /// `%=%` — LIKE with the value wrapped in `%…%`.
    LikeContains,
}

impl CompareOp {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            "%=" => Some(CompareOp::Like),
            "%=%" => Some(CompareOp::LikeContains),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Like | CompareOp::LikeContains => "LIKE",
        }
    }

    pub fn is_like(&self) -> bool {
        matches!(self, CompareOp::Like | CompareOp::LikeContains)
    }
}

/// A literal value in a WHERE comparison.
///
/// Integral literals keep an `i64` representation so 64-bit identifiers
/// round-trip exactly; only literals with a fractional part become floats.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The bare textual form of the value, without SQL quoting. Used to
    /// build LIKE patterns.
    pub fn plain_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
        }
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn direction_sql(&self) -> &'static str {
        if self.descending {
            "DESC"
        } else {
            "ASC"
        }
    }
}
