//! squery-sql: translates SQuery, the SQL-like query mini-language carried
//! in a URL parameter by the identity-management product, into SQL
//! Server-dialect SELECT statements.
//!
//! The pipeline is: URL preprocessing → lexing → parsing → validation →
//! transformation. Values are parameterized as `@pN` placeholders during
//! WHERE emission and inlined as SQL literals in the returned statement;
//! the parameter table is returned alongside for inspection.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod transform;
pub mod url_query;
pub mod util;
pub mod validator;

use indexmap::IndexMap;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::parser::SqueryParser;

pub use crate::ast::Value;
pub use crate::error::TranslateError;
pub use crate::registry::{Registry, RegistryBuilder};

/// Knobs that have no SQuery surface syntax.
///
/// `offset`/`limit` drive SQL Server `OFFSET … ROWS FETCH NEXT … ROWS
/// ONLY` paging; both are ignored when the query carries a `top`.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub offset: i64,
    pub limit: i64,
}

/// A completed translation.
#[derive(Debug)]
pub struct Translation {
    /// SQL Server SELECT statement with all values inlined as literals.
    pub sql: String,
    /// `@pN` → value as produced during WHERE emission.
    pub parameters: IndexMap<String, Value>,
    /// Non-fatal diagnostics accumulated across all pipeline stages.
    pub warnings: Vec<String>,
}

/// Translate a full request URL against a schema registry.
pub fn translate(url: &str, registry: &Registry) -> Result<Translation, TranslateError> {
    let request = url_query::parse_request(url)?;
    debug!(
        root_entity = %request.root_entity,
        squery = %request.squery,
        "translating request"
    );
    translate_squery(
        &request.squery,
        &request.root_entity,
        registry,
        &TranslateOptions::default(),
    )
}

/// Translate an already-decoded SQuery string for a known root entity.
pub fn translate_squery(
    squery: &str,
    root_entity: &str,
    registry: &Registry,
    options: &TranslateOptions,
) -> Result<Translation, TranslateError> {
    let mut diags = Diagnostics::new();

    let query = SqueryParser::parse(squery, root_entity, &mut diags)?;
    validator::validate(&query, registry, &mut diags)?;
    let output = transform::transform(&query, registry, options)?;

    Ok(Translation {
        sql: output.sql,
        parameters: output.parameters,
        warnings: diags.into_warnings(),
    })
}
