//! SQuery parser tests

use squery_sql::ast::{CompareOp, LogicalOp, Query, Value, WhereExpr};
use squery_sql::diagnostics::Diagnostics;
use squery_sql::parser::SqueryParser;
use squery_sql::TranslateError;

fn parse(squery: &str) -> (Query, Vec<String>) {
    let mut diags = Diagnostics::new();
    let query = SqueryParser::parse(squery, "Category", &mut diags).expect("parse failed");
    (query, diags.into_warnings())
}

#[test]
fn test_clauses_in_any_order() {
    let (query, warnings) = parse("order by Id top 3 where Id = 1 select Id join Role r");
    assert!(warnings.is_empty());
    assert_eq!(query.top, 3);
    assert_eq!(query.select, ["Id"]);
    assert_eq!(query.joins.len(), 1);
    assert_eq!(query.order_by.len(), 1);
    assert!(query.where_expr.is_some());
}

#[test]
fn test_repeated_clause_last_wins() {
    let (query, _) = parse("select Id select Name, Identifier");
    assert_eq!(query.select, ["Name", "Identifier"]);
}

#[test]
fn test_join_chain_with_type_filter() {
    let (query, _) = parse("join Members of type Person m join m.Manager mgr");
    assert_eq!(query.joins[0].type_filter.as_deref(), Some("Person"));
    assert_eq!(query.joins[1].parent_alias(), Some("m"));
    assert_eq!(query.joins[1].nav_prop(), "Manager");
}

#[test]
fn test_keyword_alias_accepted() {
    let (query, _) = parse("join Role type select Id");
    assert_eq!(query.joins[0].alias, "type");
}

#[test]
fn test_where_comparison_operators() {
    let (query, _) = parse("where a %= 'x' and b %=% 'y' and c != 3");
    fn collect_ops(expr: &WhereExpr, ops: &mut Vec<CompareOp>) {
        match expr {
            WhereExpr::Compare { op, .. } => ops.push(*op),
            WhereExpr::Logical { left, right, .. } => {
                collect_ops(left, ops);
                collect_ops(right, ops);
            }
            WhereExpr::Not(child) => collect_ops(child, ops),
        }
    }
    let mut ops = Vec::new();
    collect_ops(query.where_expr.as_ref().unwrap(), &mut ops);
    assert_eq!(
        ops,
        [CompareOp::Like, CompareOp::LikeContains, CompareOp::Ne]
    );
}

#[test]
fn test_nested_parens_grouping() {
    let (query, _) = parse("where ((a=1 and b=2) or (c=3 and d=4)) and e=5");
    match query.where_expr.unwrap() {
        WhereExpr::Logical { op, left, .. } => {
            assert_eq!(op, LogicalOp::And);
            assert!(matches!(
                *left,
                WhereExpr::Logical {
                    op: LogicalOp::Or,
                    ..
                }
            ));
        }
        other => panic!("expected AND at the top, got {other:?}"),
    }
}

#[test]
fn test_double_not() {
    let (query, _) = parse("where not not a = 1");
    match query.where_expr.unwrap() {
        WhereExpr::Not(inner) => assert!(matches!(*inner, WhereExpr::Not(_))),
        other => panic!("expected nested NOT, got {other:?}"),
    }
}

#[test]
fn test_unquoted_identifier_value() {
    let (query, _) = parse("where State = Active");
    match query.where_expr.unwrap() {
        WhereExpr::Compare { value, .. } => {
            assert_eq!(value, Value::Str("Active".to_string()));
        }
        other => panic!("expected compare, got {other:?}"),
    }
}

#[test]
fn test_float_value() {
    let (query, _) = parse("where Score >= 0.5");
    match query.where_expr.unwrap() {
        WhereExpr::Compare { value, .. } => assert_eq!(value, Value::Float(0.5)),
        other => panic!("expected compare, got {other:?}"),
    }
}

#[test]
fn test_fractional_top_truncates() {
    let (query, _) = parse("top 5.9");
    assert_eq!(query.top, 5);
}

#[test]
fn test_order_by_mixed_directions() {
    let (query, _) = parse("order by a, b desc, c asc");
    let directions: Vec<bool> = query.order_by.iter().map(|s| s.descending).collect();
    assert_eq!(directions, [false, true, false]);
    assert_eq!(query.order_by[1].field, "b");
}

#[test]
fn test_parse_error_reports_position() {
    let mut diags = Diagnostics::new();
    let err = SqueryParser::parse("where = 5", "Category", &mut diags).unwrap_err();
    match err {
        TranslateError::ParseError { position, .. } => assert_eq!(position, 6),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_missing_value_after_operator() {
    let mut diags = Diagnostics::new();
    let err = SqueryParser::parse("where a =", "Category", &mut diags).unwrap_err();
    assert!(matches!(err, TranslateError::ParseError { .. }));
}

#[test]
fn test_order_without_by_is_fatal() {
    let mut diags = Diagnostics::new();
    let err = SqueryParser::parse("order Id", "Category", &mut diags).unwrap_err();
    assert!(err.to_string().contains("'by'"));
}

#[test]
fn test_missing_paren_recovers_with_warning() {
    let mut diags = Diagnostics::new();
    let query =
        SqueryParser::parse("where (a=1 or (b=2 select Id", "Category", &mut diags).unwrap();
    let warnings = diags.into_warnings();
    assert!(query.where_expr.is_some());
    assert_eq!(query.select, ["Id"]);
    assert_eq!(
        warnings
            .iter()
            .filter(|w| w.contains("Missing ')'"))
            .count(),
        2
    );
}
