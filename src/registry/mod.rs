//! Schema Registry: entity-to-table bindings, foreign keys, navigation
//! overrides, column rename rules, and resource-entity metadata.
//!
//! The registry is built once at process start (by [`config::load_registry`]
//! or programmatically via [`RegistryBuilder`]) and is read-only afterwards.
//! Many translations may share one registry concurrently without
//! synchronization.

pub mod config;

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::util::qualify_table;

/// A declared foreign key: local column → referenced table/column.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub referenced_table: String,
    pub referenced_column: String,
}

/// A navigation-property override declared for an entity.
///
/// Any field left `None` falls back to the FK convention defaults
/// (`local_key = "<nav>_Id"`, `foreign_key = "Id"`, LEFT join).
#[derive(Debug, Clone, Default)]
pub struct NavOverride {
    pub target_table: String,
    pub target_entity: Option<String>,
    pub local_key: Option<String>,
    pub foreign_key: Option<String>,
    pub join_type: Option<String>,
    /// When set, the join targets a polymorphic resource row restricted to
    /// this concrete subtype via `UM_EntityTypes`.
    pub resource_sub_type: Option<String>,
}

/// A navigation property available on every resource entity type.
#[derive(Debug, Clone)]
pub struct ResourceNavProp {
    /// Raw target table; defaults to `UR_Resources` in the config loader.
    pub target_table: String,
    pub target_entity: String,
    pub local_key: Option<String>,
    pub foreign_key: Option<String>,
}

/// Metadata for a concrete subtype of the polymorphic `UR_Resources` table.
#[derive(Debug, Clone)]
pub struct ResourceEntityType {
    /// Type discriminator; 0 means the id is unknown at registry-build time
    /// and must be resolved through a `UM_EntityTypes` join.
    pub entity_type_id: i64,
    pub alias: String,
    /// Logical property name → physical base-32-indexed `C…` column.
    pub columns: HashMap<String, String>,
}

/// A fully resolved navigation property, ready for JOIN emission.
#[derive(Debug, Clone)]
pub struct ResolvedNav {
    /// `[schema].[table]`-qualified target.
    pub target_table: String,
    pub target_entity: String,
    pub local_key: String,
    pub foreign_key: String,
    pub join_type: String,
    pub resource_sub_type: Option<String>,
}

/// The read-only schema registry consumed by the validator and transformer.
///
/// Entity names, navigation-property names, aliases, and column names are
/// case-sensitive throughout; only SQuery keywords are case-insensitive.
#[derive(Debug, Default)]
pub struct Registry {
    entity_to_table: HashMap<String, String>,
    table_to_entity: HashMap<String, String>,
    entity_alias: HashMap<String, String>,
    table_columns: HashMap<String, IndexSet<String>>,
    table_fks: HashMap<String, HashMap<String, ForeignKey>>,
    nav_overrides: HashMap<String, HashMap<String, NavOverride>>,
    global_column_renames: HashMap<String, String>,
    entity_column_overrides: HashMap<String, HashMap<String, String>>,
    resource_entity_types: HashMap<String, ResourceEntityType>,
    resource_nav_props: HashMap<String, ResourceNavProp>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Raw table name for an entity, if mapped.
    pub fn table_for_entity(&self, entity: &str) -> Option<&str> {
        self.entity_to_table.get(entity).map(String::as_str)
    }

    /// Entity name for a raw table, if mapped.
    pub fn entity_for_table(&self, table: &str) -> Option<&str> {
        self.table_to_entity.get(table).map(String::as_str)
    }

    /// Short SQL alias for an entity: the declared alias, the resource
    /// entity type's alias, or the lowercased entity name.
    pub fn alias_for_entity(&self, entity: &str) -> String {
        if let Some(alias) = self.entity_alias.get(entity) {
            return alias.clone();
        }
        if let Some(res) = self.resource_entity_types.get(entity) {
            return res.alias.clone();
        }
        entity.to_ascii_lowercase()
    }

    /// Known column set for an entity's table, when the loader supplied one.
    pub fn columns_for_entity(&self, entity: &str) -> Option<&IndexSet<String>> {
        let table = self.entity_to_table.get(entity)?;
        self.table_columns.get(table)
    }

    pub fn global_rename(&self, field: &str) -> Option<&str> {
        self.global_column_renames.get(field).map(String::as_str)
    }

    pub fn column_override(&self, entity: &str, field: &str) -> Option<&str> {
        self.entity_column_overrides
            .get(entity)
            .and_then(|cols| cols.get(field))
            .map(String::as_str)
    }

    pub fn resource_entity(&self, entity: &str) -> Option<&ResourceEntityType> {
        self.resource_entity_types.get(entity)
    }

    /// Resolve a navigation property for a parent entity.
    ///
    /// Resolution order:
    /// 1. a declared `nav_overrides` entry for `(parent_entity, nav_prop)`;
    /// 2. an FK auto-deduced from the `<nav_prop>_Id` column of the parent's
    ///    table;
    /// 3. for resource entity types, the shared `resource_nav_props` table.
    ///
    /// Returns `None` when the navigation property is unknown; the caller
    /// warns and elides the JOIN.
    pub fn resolve_nav(&self, parent_entity: &str, nav_prop: &str) -> Option<ResolvedNav> {
        if let Some(nav) = self
            .nav_overrides
            .get(parent_entity)
            .and_then(|navs| navs.get(nav_prop))
        {
            return Some(ResolvedNav {
                target_table: qualify_table(&nav.target_table),
                target_entity: nav
                    .target_entity
                    .clone()
                    .unwrap_or_else(|| nav_prop.to_string()),
                local_key: nav
                    .local_key
                    .clone()
                    .unwrap_or_else(|| format!("{nav_prop}_Id")),
                foreign_key: nav.foreign_key.clone().unwrap_or_else(|| "Id".to_string()),
                join_type: nav.join_type.clone().unwrap_or_else(|| "LEFT".to_string()),
                resource_sub_type: nav.resource_sub_type.clone(),
            });
        }

        if let Some(table) = self.entity_to_table.get(parent_entity) {
            let local_key = format!("{nav_prop}_Id");
            if let Some(fk) = self
                .table_fks
                .get(table)
                .and_then(|fks| fks.get(&local_key))
            {
                let target_entity = self
                    .table_to_entity
                    .get(&fk.referenced_table)
                    .cloned()
                    .unwrap_or_else(|| nav_prop.to_string());
                return Some(ResolvedNav {
                    target_table: qualify_table(&fk.referenced_table),
                    target_entity,
                    local_key,
                    foreign_key: if fk.referenced_column.is_empty() {
                        "Id".to_string()
                    } else {
                        fk.referenced_column.clone()
                    },
                    join_type: "LEFT".to_string(),
                    resource_sub_type: None,
                });
            }
        }

        if self.resource_entity_types.contains_key(parent_entity) {
            if let Some(nav) = self.resource_nav_props.get(nav_prop) {
                return Some(ResolvedNav {
                    target_table: qualify_table(&nav.target_table),
                    target_entity: nav.target_entity.clone(),
                    local_key: nav
                        .local_key
                        .clone()
                        .unwrap_or_else(|| format!("{nav_prop}_Id")),
                    foreign_key: nav.foreign_key.clone().unwrap_or_else(|| "Id".to_string()),
                    join_type: "LEFT".to_string(),
                    resource_sub_type: None,
                });
            }
        }

        None
    }
}

/// Incrementally assembles an immutable [`Registry`].
///
/// External loaders (config files, introspection, swagger ingestion) fold
/// their source format into these calls; the core never sees the source.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an entity to its raw table. The inverse `table → entity` map
    /// keeps the first binding when several entities share one physical
    /// table (the resource entity types all live in `UR_Resources`).
    pub fn entity(mut self, entity: &str, table: &str) -> Self {
        self.registry
            .entity_to_table
            .insert(entity.to_string(), table.to_string());
        self.registry
            .table_to_entity
            .entry(table.to_string())
            .or_insert_with(|| entity.to_string());
        self
    }

    pub fn alias(mut self, entity: &str, alias: &str) -> Self {
        self.registry
            .entity_alias
            .insert(entity.to_string(), alias.to_string());
        self
    }

    pub fn columns(mut self, table: &str, columns: &[&str]) -> Self {
        let set = self
            .registry
            .table_columns
            .entry(table.to_string())
            .or_default();
        for column in columns {
            set.insert((*column).to_string());
        }
        self
    }

    pub fn foreign_key(
        mut self,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> Self {
        self.registry
            .table_fks
            .entry(table.to_string())
            .or_default()
            .insert(
                column.to_string(),
                ForeignKey {
                    referenced_table: referenced_table.to_string(),
                    referenced_column: referenced_column.to_string(),
                },
            );
        self
    }

    pub fn nav_override(mut self, entity: &str, nav_prop: &str, nav: NavOverride) -> Self {
        self.registry
            .nav_overrides
            .entry(entity.to_string())
            .or_default()
            .insert(nav_prop.to_string(), nav);
        self
    }

    pub fn global_rename(mut self, field: &str, column: &str) -> Self {
        self.registry
            .global_column_renames
            .insert(field.to_string(), column.to_string());
        self
    }

    pub fn column_override(mut self, entity: &str, field: &str, column: &str) -> Self {
        self.registry
            .entity_column_overrides
            .entry(entity.to_string())
            .or_default()
            .insert(field.to_string(), column.to_string());
        self
    }

    pub fn resource_entity(mut self, entity: &str, resource: ResourceEntityType) -> Self {
        self.registry
            .resource_entity_types
            .insert(entity.to_string(), resource);
        self
    }

    pub fn resource_nav_prop(mut self, nav_prop: &str, nav: ResourceNavProp) -> Self {
        self.registry
            .resource_nav_props
            .insert(nav_prop.to_string(), nav);
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}
