//! Transformer tests: join emission, field rewriting, WHERE emission

use squery_sql::ast::Value;
use squery_sql::diagnostics::Diagnostics;
use squery_sql::parser::SqueryParser;
use squery_sql::transform::{rewrite_column, transform, TransformOutput};
use squery_sql::validator::validate;
use squery_sql::TranslateOptions;

use crate::common::fixture_registry;

fn run(squery: &str, root: &str) -> TransformOutput {
    run_with(squery, root, &TranslateOptions::default())
}

fn run_with(squery: &str, root: &str, options: &TranslateOptions) -> TransformOutput {
    let registry = fixture_registry();
    let mut diags = Diagnostics::new();
    let query = SqueryParser::parse(squery, root, &mut diags).unwrap();
    validate(&query, &registry, &mut diags).unwrap();
    transform(&query, &registry, options).unwrap()
}

#[test]
fn test_bare_fields_use_root_alias() {
    let output = run("select Id, Identifier", "Category");
    assert_eq!(
        output.sql,
        "SELECT cat.Id, cat.Identifier FROM [dbo].[UP_Categories] cat"
    );
}

#[test]
fn test_global_rename_applies() {
    let output = run("select DisplayName", "Category");
    assert!(output.sql.contains("cat.DisplayName_L1"));
}

#[test]
fn test_entity_override_defeats_fk_auto_rename() {
    // Category declares an identity override for ParentId; without it the
    // FooId → Foo_Id convention would rewrite it.
    let output = run("select ParentId", "Category");
    assert!(output.sql.contains("cat.ParentId"), "{}", output.sql);
}

#[test]
fn test_fk_auto_rename_without_override() {
    let registry = fixture_registry();
    assert_eq!(rewrite_column(&registry, "Role", "OwnerId"), "Owner_Id");
}

#[test]
fn test_where_null_comparisons() {
    let output = run("where ParentId = null", "Category");
    assert!(output.sql.contains("cat.ParentId IS NULL"));
    assert!(output.parameters.is_empty());

    let output = run("where ParentId != null", "Category");
    assert!(output.sql.contains("cat.ParentId IS NOT NULL"));
}

#[test]
fn test_not_around_null_comparison() {
    let output = run("where not ParentId = null", "Category");
    assert!(
        output.sql.contains("NOT (cat.ParentId IS NULL)"),
        "{}",
        output.sql
    );
}

#[test]
fn test_like_operators_wrap_value() {
    let output = run("where Identifier %= 'adm'", "Category");
    assert!(output.sql.contains("cat.Identifier LIKE '%adm%'"));
    assert_eq!(output.parameters["@p1"], Value::Str("%adm%".to_string()));

    let output = run("where Identifier %=% 'adm'", "Category");
    assert!(output.sql.contains("cat.Identifier LIKE '%adm%'"));
}

#[test]
fn test_boolean_value_becomes_bit() {
    let output = run("where IsIndirect = false", "AssignedSingleRole");
    assert!(output.sql.contains("asr.IsIndirect = 0"));
    assert_eq!(output.parameters["@p1"], Value::Bool(false));
}

#[test]
fn test_parameterized_sql_has_each_placeholder_once() {
    let output = run(
        "where OwnerType = 2015 and WorkflowState = 8 or WorkflowState = 9",
        "AssignedSingleRole",
    );
    for n in 1..=3 {
        let placeholder = format!("@p{n}");
        assert_eq!(
            output.parameterized_sql.matches(&placeholder).count(),
            1,
            "{placeholder} in {}",
            output.parameterized_sql
        );
        assert!(!output.sql.contains(&placeholder), "{}", output.sql);
    }
    assert_eq!(output.parameters.len(), 3);
}

#[test]
fn test_join_via_fk_deduction() {
    let output = run("join Role r select r.Id", "AssignedSingleRole");
    assert!(output
        .sql
        .contains("LEFT JOIN [dbo].[UP_SingleRoles] r ON asr.Role_Id = r.Id"));
}

#[test]
fn test_chained_join_uses_parent_alias() {
    let output = run("join Role r join r.Policy rp select rp.Id", "AssignedSingleRole");
    assert!(output
        .sql
        .contains("LEFT JOIN [dbo].[UP_Policies] rp ON r.Policy_Id = rp.Id"));
}

#[test]
fn test_unresolved_join_elided_but_alias_bound() {
    let registry = fixture_registry();
    let mut diags = Diagnostics::new();
    let query =
        SqueryParser::parse("join FakeNavProp fnp select Id, fnp.Id", "Category", &mut diags)
            .unwrap();
    validate(&query, &registry, &mut diags).unwrap();
    let output = transform(&query, &registry, &TranslateOptions::default()).unwrap();
    assert!(!output.sql.contains("JOIN"), "{}", output.sql);
    // The dangling alias still resolves so the select list stays coherent.
    assert!(output.sql.contains("fnp.Id"));
}

#[test]
fn test_resource_root_known_type_id_filter() {
    let output = run("select Id", "Directory_FR_User");
    assert!(output.sql.contains("WHERE dfru.Type = 2015"), "{}", output.sql);
    assert!(!output.sql.contains("UM_EntityTypes"));
}

#[test]
fn test_resource_root_unknown_type_id_joins_catalog() {
    let output = run("select Id", "Directory_Unknown");
    assert!(
        output.sql.contains(
            "INNER JOIN [dbo].[UM_EntityTypes] du_et ON du_et.Id = du.Type \
             AND du_et.Identifier = 'Directory_Unknown'"
        ),
        "{}",
        output.sql
    );
    assert!(!output.sql.contains("du.Type = 0"));
    assert!(!output.sql.contains("WHERE"));
}

#[test]
fn test_resource_root_unknown_type_id_keeps_user_where_untouched() {
    // The catalog JOIN and the user WHERE stay independent.
    let output = run("select Id where Id = 7", "Directory_Unknown");
    assert!(output.sql.contains("INNER JOIN [dbo].[UM_EntityTypes] du_et"));
    assert!(output.sql.contains("WHERE du.Id = 7"), "{}", output.sql);
}

#[test]
fn test_resource_column_map_with_id_retry() {
    let output = run("select DisplayName where PresenceState_Id = 42", "Directory_FR_User");
    assert!(output.sql.contains("dfru.CC"), "{}", output.sql);
    assert!(output.sql.contains("dfru.C40 = 42"), "{}", output.sql);
}

#[test]
fn test_resource_subtype_join_emits_catalog_lookup_first() {
    let output = run("join PresenceState ps select Id, ps.Id", "Directory_FR_User");
    let catalog = output
        .sql
        .find("LEFT JOIN [dbo].[UM_EntityTypes] ps_et ON ps_et.Identifier = 'PresenceState'")
        .expect("catalog join missing");
    let resource = output
        .sql
        .find(
            "LEFT JOIN [dbo].[UR_Resources] ps ON dfru.PresenceState_Id = ps.Id \
             AND ps.Type = ps_et.Id",
        )
        .expect("resource join missing");
    assert!(catalog < resource, "{}", output.sql);
}

#[test]
fn test_paging_options_emit_offset_fetch() {
    let options = TranslateOptions {
        offset: 40,
        limit: 20,
    };
    let output = run_with("select Id", "Category", &options);
    assert!(output
        .sql
        .ends_with("ORDER BY (SELECT NULL) OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"));
}

#[test]
fn test_top_wins_over_paging_options() {
    let options = TranslateOptions {
        offset: 40,
        limit: 20,
    };
    let output = run_with("top 5 select Id", "Category", &options);
    assert!(output.sql.contains("SELECT TOP 5"));
    assert!(!output.sql.contains("OFFSET"));
}

#[test]
fn test_rewrite_column_is_pure_across_calls() {
    let registry = fixture_registry();
    for _ in 0..3 {
        assert_eq!(
            rewrite_column(&registry, "Directory_FR_User", "PresenceState_Id"),
            "C40"
        );
        assert_eq!(rewrite_column(&registry, "Category", "DisplayName"), "DisplayName_L1");
    }
}
