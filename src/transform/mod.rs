//! AST → SQL transformation.
//!
//! Walks a validated [`Query`], resolves joins and columns against the
//! Schema Registry, and feeds a [`SqlBuilder`]. The transformer assumes
//! the validator has already run: user-facing alias errors were reported
//! there, so an unbound alias here is a pipeline bug and surfaces as an
//! internal error.

pub mod sql_builder;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{CompareOp, Query, Value, WhereExpr};
use crate::error::TranslateError;
use crate::registry::Registry;
use crate::util::{escape_string_literal, qualify_table};
use crate::TranslateOptions;

pub use sql_builder::SqlBuilder;

/// Result of one transformation.
#[derive(Debug)]
pub struct TransformOutput {
    /// Final SQL with all parameters inlined as literals.
    pub sql: String,
    /// The same statement with `@pN` placeholders still in place.
    pub parameterized_sql: String,
    /// `@pN` → value, for caller inspection.
    pub parameters: IndexMap<String, Value>,
}

/// Transform a query into SQL Server SELECT text.
pub fn transform(
    query: &Query,
    registry: &Registry,
    options: &TranslateOptions,
) -> Result<TransformOutput, TranslateError> {
    let mut transformer = Transformer {
        registry,
        builder: SqlBuilder::new(),
    };
    transformer.run(query, options)
}

struct Transformer<'a> {
    registry: &'a Registry,
    builder: SqlBuilder,
}

impl<'a> Transformer<'a> {
    fn run(
        mut self,
        query: &Query,
        options: &TranslateOptions,
    ) -> Result<TransformOutput, TranslateError> {
        let root_filter = self.emit_from(query)?;
        self.emit_joins(query)?;

        for field in &query.select {
            let resolved = self.resolve_field(field)?;
            self.builder.push_select(resolved);
        }

        let user_where = match &query.where_expr {
            Some(expr) => Some(self.emit_where(expr)?),
            None => None,
        };
        match (root_filter, user_where) {
            (Some(filter), Some(user)) => self.builder.set_where(format!("{filter} AND ({user})")),
            (Some(filter), None) => self.builder.set_where(filter),
            (None, Some(user)) => self.builder.set_where(user),
            (None, None) => {}
        }

        for sort in &query.order_by {
            let resolved = self.resolve_field(&sort.field)?;
            self.builder
                .push_order_by(format!("{resolved} {}", sort.direction_sql()));
        }

        self.builder.set_top(query.top);
        self.builder.set_offset(options.offset);
        self.builder.set_limit(options.limit);

        let sql = self.builder.build_inlined();
        let parameterized_sql = self.builder.build();
        debug!(%sql, "transformation complete");
        Ok(TransformOutput {
            sql,
            parameterized_sql,
            parameters: self.builder.into_parameters(),
        })
    }

    /// Emit the FROM clause and, for resource entity roots, the
    /// entity-type restriction. Returns the WHERE prefix when the
    /// restriction takes the filter form.
    fn emit_from(&mut self, query: &Query) -> Result<Option<String>, TranslateError> {
        let entity = &query.root_entity;
        let table = self
            .registry
            .table_for_entity(entity)
            .ok_or_else(|| TranslateError::UnknownEntity {
                entity: entity.clone(),
            })?;
        let alias = self.registry.alias_for_entity(entity);

        self.builder.set_from(qualify_table(table), alias.clone());
        self.builder.bind_alias(alias.clone(), entity.clone());

        if let Some(resource) = self.registry.resource_entity(entity) {
            if resource.entity_type_id > 0 {
                return Ok(Some(format!(
                    "{alias}.Type = {}",
                    resource.entity_type_id
                )));
            }
            // Unknown type id: restrict through the entity-type catalog
            // instead. The user WHERE stays untouched.
            self.builder.push_join(format!(
                "INNER JOIN [dbo].[UM_EntityTypes] {alias}_et ON {alias}_et.Id = {alias}.Type \
                 AND {alias}_et.Identifier = '{}'",
                escape_string_literal(entity)
            ));
        }

        Ok(None)
    }

    fn emit_joins(&mut self, query: &Query) -> Result<(), TranslateError> {
        let root_alias = self.registry.alias_for_entity(&query.root_entity);

        for join in &query.joins {
            let parent_alias = join.parent_alias().unwrap_or(&root_alias);
            let nav_prop = join.nav_prop();

            let parent_entity = self
                .builder
                .alias_entity(parent_alias)
                .ok_or_else(|| {
                    TranslateError::internal(format!(
                        "alias '{parent_alias}' not bound during join emission"
                    ))
                })?
                .to_string();

            let Some(nav) = self.registry.resolve_nav(&parent_entity, nav_prop) else {
                // Unresolved: the validator warned and the JOIN is elided.
                // The alias still binds so later resolution stays coherent.
                self.builder.bind_alias(join.alias.clone(), nav_prop);
                continue;
            };

            let alias = &join.alias;
            if let Some(sub_type) = &nav.resource_sub_type {
                // Type-filtered resource lookup stays polymorphic: resolve
                // the subtype id first, then join the resource row on it.
                self.builder.push_join(format!(
                    "LEFT JOIN [dbo].[UM_EntityTypes] {alias}_et ON {alias}_et.Identifier = '{}'",
                    escape_string_literal(sub_type)
                ));
                self.builder.push_join(format!(
                    "{} JOIN {} {alias} ON {parent_alias}.{} = {alias}.{} \
                     AND {alias}.Type = {alias}_et.Id",
                    nav.join_type, nav.target_table, nav.local_key, nav.foreign_key
                ));
            } else {
                self.builder.push_join(format!(
                    "{} JOIN {} {alias} ON {parent_alias}.{} = {alias}.{}",
                    nav.join_type, nav.target_table, nav.local_key, nav.foreign_key
                ));
            }

            self.builder.bind_alias(alias.clone(), nav.target_entity);
        }

        Ok(())
    }

    /// Resolve `alias.col` (or bare `col` on the root alias) to its
    /// rewritten SQL form.
    fn resolve_field(&self, field: &str) -> Result<String, TranslateError> {
        let (alias, column) = match field.split_once('.') {
            Some((alias, column)) => (alias, column),
            None => (self.builder.from_alias(), field),
        };

        let entity = self.builder.alias_entity(alias).ok_or_else(|| {
            TranslateError::internal(format!(
                "alias '{alias}' not bound during field resolution"
            ))
        })?;

        let rewritten = rewrite_column(self.registry, entity, column);
        Ok(format!("{alias}.{rewritten}"))
    }

    /// Emit one WHERE subtree, preserving short-circuit-safe
    /// parenthesization.
    fn emit_where(&mut self, expr: &WhereExpr) -> Result<String, TranslateError> {
        match expr {
            WhereExpr::Compare { field, op, value } => {
                let resolved = self.resolve_field(field)?;
                if value.is_null() && matches!(op, CompareOp::Eq | CompareOp::Ne) {
                    let null_test = if *op == CompareOp::Eq {
                        "IS NULL"
                    } else {
                        "IS NOT NULL"
                    };
                    return Ok(format!("{resolved} {null_test}"));
                }
                if op.is_like() {
                    let pattern = format!("%{}%", value.plain_text());
                    let placeholder = self.builder.add_parameter(Value::Str(pattern));
                    return Ok(format!("{resolved} LIKE {placeholder}"));
                }
                let placeholder = self.builder.add_parameter(value.clone());
                Ok(format!("{resolved} {} {placeholder}", op.as_sql()))
            }
            WhereExpr::Logical { left, op, right } => {
                let left = self.emit_where(left)?;
                let right = self.emit_where(right)?;
                Ok(format!("({left} {} {right})", op.as_sql()))
            }
            WhereExpr::Not(child) => {
                let child = self.emit_where(child)?;
                Ok(format!("NOT ({child})"))
            }
        }
    }
}

/// Rewrite a logical column name for an entity. Pure: identical inputs
/// always yield identical outputs.
///
/// Rules, first match wins:
/// 1. per-entity column override;
/// 2. resource column map, retrying with a trailing `_Id` stripped so a
///    `<Prop>_Id` reference reuses the `<Prop>` FK column;
/// 3. global column rename;
/// 4. FK convention rename `FooId → Foo_Id`;
/// 5. pass through unchanged.
pub fn rewrite_column(registry: &Registry, entity: &str, column: &str) -> String {
    if let Some(renamed) = registry.column_override(entity, column) {
        return renamed.to_string();
    }

    if let Some(resource) = registry.resource_entity(entity) {
        if let Some(mapped) = resource.columns.get(column) {
            return mapped.clone();
        }
        if column.len() > 3 {
            if let Some(base) = column.strip_suffix("_Id") {
                if let Some(mapped) = resource.columns.get(base) {
                    return mapped.clone();
                }
            }
        }
    }

    if let Some(renamed) = registry.global_rename(column) {
        return renamed.to_string();
    }

    if column != "Id" && column.ends_with("Id") && !column.ends_with("_Id") {
        return format!("{}_Id", &column[..column.len() - 2]);
    }

    column.to_string()
}
