//! Semantic validation of a parsed [`Query`] against the Schema Registry.
//!
//! Two phases: build the alias→entity scope left-to-right (matching the
//! source-order semantics of chained joins), then check every field
//! reference in SELECT, WHERE, and ORDER BY against that scope.
//!
//! Fatal conditions return a [`TranslateError`]; everything recoverable is
//! pushed into the shared [`Diagnostics`] and translation continues. An
//! unresolved navigation property in particular only warns: the transformer
//! elides the JOIN, and the alias stays bound so later references to it
//! produce a clear "not recognized" warning instead of a cascade of
//! undeclared-alias errors.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{Query, Value, WhereExpr};
use crate::diagnostics::{Clause, Diagnostics};
use crate::error::TranslateError;
use crate::registry::Registry;

/// Warn instead of error above this TOP value.
const TOP_WARN_LIMIT: i64 = 10_000;
/// Stop walking WHERE branches nested deeper than this.
const MAX_WHERE_DEPTH: usize = 10;
/// Warn about string values longer than this.
const MAX_STRING_LEN: usize = 4000;

/// Validate a query. Warnings accumulate in `diags`; the first fatal
/// condition aborts.
pub fn validate(
    query: &Query,
    registry: &Registry,
    diags: &mut Diagnostics,
) -> Result<(), TranslateError> {
    if registry.table_for_entity(&query.root_entity).is_none() {
        return Err(TranslateError::UnknownEntity {
            entity: query.root_entity.clone(),
        });
    }

    if query.is_empty() {
        diags.warn("SQuery is empty; the query will return all rows with SELECT *");
    }

    if query.top < 0 {
        return Err(TranslateError::validation(format!(
            "top cannot be negative (got {})",
            query.top
        )));
    }
    if query.top > TOP_WARN_LIMIT {
        diags.warn(format!(
            "top {} exceeds {TOP_WARN_LIMIT}; consider paging instead",
            query.top
        ));
    }

    let scope = build_scope(query, registry, diags)?;
    debug!(aliases = scope.entries.len(), "alias scope constructed");

    for field in &query.select {
        check_field(field, Clause::Select, &scope, registry, diags)?;
    }
    if let Some(where_expr) = &query.where_expr {
        check_where(where_expr, 1, &scope, registry, diags)?;
    }
    for sort in &query.order_by {
        check_field(&sort.field, Clause::OrderBy, &scope, registry, diags)?;
    }

    Ok(())
}

/// Alias scope built in declaration order.
struct AliasScope {
    /// alias → entity, insertion-ordered so error messages list aliases the
    /// way the user declared them.
    entries: IndexMap<String, String>,
    /// Aliases whose navigation property could not be resolved. Field
    /// checks against these are skipped; the JOIN warning already fired.
    unresolved: HashSet<String>,
    root_alias: String,
}

impl AliasScope {
    fn available(&self) -> String {
        self.entries
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn build_scope(
    query: &Query,
    registry: &Registry,
    diags: &mut Diagnostics,
) -> Result<AliasScope, TranslateError> {
    let root_alias = registry.alias_for_entity(&query.root_entity);
    let mut scope = AliasScope {
        entries: IndexMap::new(),
        unresolved: HashSet::new(),
        root_alias: root_alias.clone(),
    };
    scope
        .entries
        .insert(root_alias.clone(), query.root_entity.clone());

    for join in &query.joins {
        // Alias collisions are detected case-insensitively: two aliases
        // differing only in case are almost always a typo.
        if join.alias.eq_ignore_ascii_case(&root_alias) {
            return Err(TranslateError::validation(format!(
                "JOIN: alias '{}' collides with the root alias '{}'",
                join.alias, root_alias
            )));
        }
        if scope
            .entries
            .keys()
            .any(|existing| existing.eq_ignore_ascii_case(&join.alias))
        {
            return Err(TranslateError::validation(format!(
                "JOIN: alias '{}' is declared more than once",
                join.alias
            )));
        }

        let parent_alias = join.parent_alias().unwrap_or(&root_alias);
        let nav_prop = join.nav_prop();

        let parent_entity = match scope.entries.get(parent_alias) {
            Some(entity) => entity.clone(),
            None => {
                return Err(TranslateError::validation(format!(
                    "JOIN: alias '{}' is not declared. Available aliases: {}",
                    parent_alias,
                    scope.available()
                )));
            }
        };

        match registry.resolve_nav(&parent_entity, nav_prop) {
            Some(nav) => {
                scope
                    .entries
                    .insert(join.alias.clone(), nav.target_entity.clone());
            }
            None => {
                diags.warn_in(
                    Clause::Join,
                    format!(
                        "navigation property '{nav_prop}' could not be resolved for entity \
                         '{parent_entity}'; the LEFT JOIN was skipped. If it is a declared \
                         relationship, add it to `navigationPropertyOverrides` for entity \
                         {parent_entity}."
                    ),
                );
                scope.unresolved.insert(join.alias.clone());
                // Bind anyway, defaulting the target to the nav-prop name,
                // so later references warn instead of erroring.
                scope
                    .entries
                    .insert(join.alias.clone(), nav_prop.to_string());
            }
        }
    }

    Ok(scope)
}

fn check_field(
    field: &str,
    clause: Clause,
    scope: &AliasScope,
    registry: &Registry,
    diags: &mut Diagnostics,
) -> Result<(), TranslateError> {
    let (alias, column) = match field.split_once('.') {
        Some((alias, column)) => (alias, column),
        None => (scope.root_alias.as_str(), field),
    };

    let entity = match scope.entries.get(alias) {
        Some(entity) => entity,
        None => {
            return Err(TranslateError::validation(format!(
                "{}: alias '{}' is not declared. Available aliases: {}",
                clause.as_str(),
                alias,
                scope.available()
            )));
        }
    };

    if scope.unresolved.contains(alias) {
        return Ok(());
    }

    if let Some(columns) = registry.columns_for_entity(entity) {
        if !columns.contains(column) {
            diags.warn_in(
                clause,
                format!(
                    "column '{column}' is not recognized on entity '{entity}'. This may be a \
                     typo, a navigation property, or a computed field."
                ),
            );
        }
    }

    Ok(())
}

fn check_where(
    expr: &WhereExpr,
    depth: usize,
    scope: &AliasScope,
    registry: &Registry,
    diags: &mut Diagnostics,
) -> Result<(), TranslateError> {
    if depth > MAX_WHERE_DEPTH {
        diags.warn_in(
            Clause::Where,
            format!("expression nesting exceeds {MAX_WHERE_DEPTH} levels; deeper conditions were not validated"),
        );
        return Ok(());
    }

    match expr {
        WhereExpr::Compare { field, value, .. } => {
            check_field(field, Clause::Where, scope, registry, diags)?;
            if let Value::Str(s) = value {
                if s.len() > MAX_STRING_LEN {
                    diags.warn_in(
                        Clause::Where,
                        format!(
                            "string value for '{field}' is {} characters long (limit {MAX_STRING_LEN})",
                            s.len()
                        ),
                    );
                }
            }
            Ok(())
        }
        WhereExpr::Logical { left, right, .. } => {
            check_where(left, depth + 1, scope, registry, diags)?;
            check_where(right, depth + 1, scope, registry, diags)
        }
        WhereExpr::Not(child) => check_where(child, depth + 1, scope, registry, diags),
    }
}
