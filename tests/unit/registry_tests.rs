//! Schema registry and config loader tests

use std::io::Write;

use tempfile::NamedTempFile;

use squery_sql::registry::config::load_registry;
use squery_sql::TranslateError;

use crate::common::fixture_registry;

/// Helper to create a temp registry config file with content
fn create_config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_fixture_resolution_order_override_beats_fk() {
    let registry = fixture_registry();
    // Role resolves through the declared FK on UP_AssignedSingleRoles.
    let nav = registry.resolve_nav("AssignedSingleRole", "Role").unwrap();
    assert_eq!(nav.target_table, "[dbo].[UP_SingleRoles]");
    // PresenceState resolves through the navigation override, which
    // carries the resource sub-type.
    let nav = registry
        .resolve_nav("Directory_FR_User", "PresenceState")
        .unwrap();
    assert_eq!(nav.resource_sub_type.as_deref(), Some("PresenceState"));
}

#[test]
fn test_fixture_alias_chain() {
    let registry = fixture_registry();
    assert_eq!(registry.alias_for_entity("Category"), "cat");
    // Resource entity aliases come from the resource metadata.
    assert_eq!(registry.alias_for_entity("Directory_FR_User"), "dfru");
    assert_eq!(registry.alias_for_entity("NotThere"), "notthere");
}

#[test]
fn test_load_registry_from_file() {
    let file = create_config_file(
        r#"{
            "entities": [
                {
                    "name": "Category",
                    "table": "UP_Categories",
                    "alias": "cat",
                    "columns": ["Id", "Identifier", "DisplayName", "ParentId"],
                    "columnOverrides": { "ParentId": "ParentId" }
                },
                {
                    "name": "AssignedSingleRole",
                    "table": "UP_AssignedSingleRoles",
                    "alias": "asr",
                    "foreignKeys": [
                        { "column": "Role_Id", "referencesTable": "UP_SingleRoles" }
                    ]
                },
                { "name": "Role", "table": "UP_SingleRoles" }
            ],
            "globalColumnRenames": { "DisplayName": "DisplayName_L1" }
        }"#,
    );

    let registry = load_registry(file.path()).unwrap();
    assert_eq!(registry.table_for_entity("Category"), Some("UP_Categories"));
    assert_eq!(registry.global_rename("DisplayName"), Some("DisplayName_L1"));

    let nav = registry.resolve_nav("AssignedSingleRole", "Role").unwrap();
    assert_eq!(nav.target_entity, "Role");
    assert_eq!(nav.local_key, "Role_Id");
}

#[test]
fn test_load_registry_missing_file() {
    let err = load_registry(std::path::Path::new("/nonexistent/registry.json")).unwrap_err();
    assert!(matches!(err, TranslateError::RegistryReadError { .. }));
}

#[test]
fn test_load_registry_malformed_json() {
    let file = create_config_file("{ not json");
    let err = load_registry(file.path()).unwrap_err();
    assert!(matches!(err, TranslateError::RegistryParseError { .. }));
}

#[test]
fn test_load_registry_resource_defaults() {
    let file = create_config_file(
        r#"{
            "entities": [
                {
                    "name": "Directory_FR_User",
                    "table": "UR_Resources",
                    "resourceEntityType": { "alias": "dfru" }
                }
            ],
            "resourceNavigationProperties": {
                "Tenant": { "targetEntity": "Tenant" }
            }
        }"#,
    );

    let registry = load_registry(file.path()).unwrap();
    // entityTypeId defaults to 0 (unknown), targetTable to UR_Resources.
    assert_eq!(
        registry.resource_entity("Directory_FR_User").unwrap().entity_type_id,
        0
    );
    let nav = registry.resolve_nav("Directory_FR_User", "Tenant").unwrap();
    assert_eq!(nav.target_table, "[dbo].[UR_Resources]");
}
