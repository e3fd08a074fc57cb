//! Shared utility helpers.

/// Qualify a raw table name as `[schema].[name]`.
///
/// Names that already carry a bracketed schema prefix are returned as-is.
/// A bare `schema.name` is bracketed per part; anything else is treated as
/// a raw table under the default `dbo` schema.
pub fn qualify_table(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with('[') && trimmed.contains("].[") {
        return trimmed.to_string();
    }
    if let Some((schema, table)) = trimmed.split_once('.') {
        return format!("[{}].[{}]", strip_brackets(schema), strip_brackets(table));
    }
    format!("[dbo].[{}]", strip_brackets(trimmed))
}

/// Escape a string for use inside a single-quoted SQL Server literal.
///
/// Embedded single quotes are doubled; no other characters need escaping
/// in the T-SQL string literal syntax.
#[inline]
pub fn escape_string_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn strip_brackets(ident: &str) -> &str {
    ident.trim().trim_matches(|c| c == '[' || c == ']')
}
