//! JSON registry loader.
//!
//! The core defines only the registry *shape*; this loader is one of the
//! acceptable sources. It reads a JSON document whose property names match
//! the identity-management product's configuration surface
//! (`navigationPropertyOverrides`, `globalColumnRenames`, …) and folds it
//! into a [`Registry`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{NavOverride, Registry, RegistryBuilder, ResourceEntityType, ResourceNavProp};
use crate::error::TranslateError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub global_column_renames: HashMap<String, String>,
    #[serde(default)]
    pub resource_navigation_properties: HashMap<String, ResourceNavConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConfig>,
    #[serde(default)]
    pub navigation_property_overrides: HashMap<String, NavOverrideConfig>,
    #[serde(default)]
    pub column_overrides: HashMap<String, String>,
    #[serde(default)]
    pub resource_entity_type: Option<ResourceEntityTypeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyConfig {
    pub column: String,
    pub references_table: String,
    #[serde(default = "default_id_column")]
    pub references_column: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavOverrideConfig {
    pub target_table: String,
    #[serde(default)]
    pub target_entity: Option<String>,
    #[serde(default)]
    pub local_key: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub join_type: Option<String>,
    #[serde(default)]
    pub resource_sub_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntityTypeConfig {
    #[serde(default)]
    pub entity_type_id: i64,
    pub alias: String,
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNavConfig {
    #[serde(default = "default_resource_table")]
    pub target_table: String,
    pub target_entity: String,
    #[serde(default)]
    pub local_key: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<String>,
}

fn default_id_column() -> String {
    "Id".to_string()
}

fn default_resource_table() -> String {
    "UR_Resources".to_string()
}

/// Load a registry from a JSON config file.
pub fn load_registry(path: &Path) -> Result<Registry, TranslateError> {
    let content = fs::read_to_string(path).map_err(|e| TranslateError::RegistryReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: RegistryConfig =
        serde_json::from_str(&content).map_err(|e| TranslateError::RegistryParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
    from_config(config)
}

/// Fold a parsed config into an immutable registry.
pub fn from_config(config: RegistryConfig) -> Result<Registry, TranslateError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for entity in &config.entities {
        if let Some(previous) = seen.insert(entity.name.clone(), entity.table.clone()) {
            return Err(TranslateError::InvalidRegistry {
                message: format!(
                    "entity '{}' is declared twice (tables '{}' and '{}')",
                    entity.name, previous, entity.table
                ),
            });
        }
    }
    let entity_count = seen.len();

    let mut builder = RegistryBuilder::new();

    for entity in config.entities {
        builder = builder.entity(&entity.name, &entity.table);
        if let Some(alias) = &entity.alias {
            builder = builder.alias(&entity.name, alias);
        }
        if !entity.columns.is_empty() {
            let columns: Vec<&str> = entity.columns.iter().map(String::as_str).collect();
            builder = builder.columns(&entity.table, &columns);
        }
        for fk in entity.foreign_keys {
            builder = builder.foreign_key(
                &entity.table,
                &fk.column,
                &fk.references_table,
                &fk.references_column,
            );
        }
        for (nav_prop, nav) in entity.navigation_property_overrides {
            builder = builder.nav_override(
                &entity.name,
                &nav_prop,
                NavOverride {
                    target_table: nav.target_table,
                    target_entity: nav.target_entity,
                    local_key: nav.local_key,
                    foreign_key: nav.foreign_key,
                    join_type: nav.join_type,
                    resource_sub_type: nav.resource_sub_type,
                },
            );
        }
        for (field, column) in entity.column_overrides {
            builder = builder.column_override(&entity.name, &field, &column);
        }
        if let Some(resource) = entity.resource_entity_type {
            builder = builder.resource_entity(
                &entity.name,
                ResourceEntityType {
                    entity_type_id: resource.entity_type_id,
                    alias: resource.alias,
                    columns: resource.columns,
                },
            );
        }
    }

    for (field, column) in config.global_column_renames {
        builder = builder.global_rename(&field, &column);
    }
    for (nav_prop, nav) in config.resource_navigation_properties {
        builder = builder.resource_nav_prop(
            &nav_prop,
            ResourceNavProp {
                target_table: nav.target_table,
                target_entity: nav.target_entity,
                local_key: nav.local_key,
                foreign_key: nav.foreign_key,
            },
        );
    }

    debug!(entities = entity_count, "registry loaded");
    Ok(builder.build())
}
