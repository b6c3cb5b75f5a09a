//! ORDER BY Resolution Tests
//!
//! Resolution must:
//! - Prefer output aliases, then ordinals, then computed renders
//! - Reject out-of-range ordinals and non-integer constants
//! - Reject ambiguous aliases unless every match computes the same value
//! - Expand INDEX and PRIMARY KEY items through the catalog
//! - Reject ordering by array columns on every path

use aerosort::executor::{PlanNode, RenderNode, ValuesNode};
use aerosort::planner::{
    BinaryOp, Expr, IndexDescriptor, IndexDirection, MemoryCatalog, Order, OrderByResolver,
    PlannerError, SortDirection, SortPlan, TableDescriptor,
};
use aerosort::schema::{ColumnOrderInfo, Datum, DatumType, ResultColumn};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

/// Table `t(k, x, y, tags)` with a secondary index `idx(x ASC, y DESC)`
fn catalog() -> MemoryCatalog {
    MemoryCatalog::from_tables(vec![TableDescriptor {
        name: "t".into(),
        primary_index: IndexDescriptor::ascending("primary", ["k"]),
        indexes: vec![IndexDescriptor::with_directions(
            "idx",
            [("x", IndexDirection::Asc), ("y", IndexDirection::Desc)],
        )],
    }])
}

fn table_rows() -> ValuesNode {
    ValuesNode::from_rows(
        vec![
            ResultColumn::new("k", DatumType::Int),
            ResultColumn::new("x", DatumType::Int),
            ResultColumn::new("y", DatumType::String),
            ResultColumn::new("tags", DatumType::array_of(DatumType::Int)),
        ],
        vec![vec![
            Datum::Int(1),
            Datum::Int(10),
            Datum::String("a".into()),
            Datum::Array(vec![Datum::Int(1)]),
        ]],
    )
    .unwrap()
}

/// `SELECT <targets> FROM t`
fn select(targets: Vec<(Option<&str>, Expr)>) -> RenderNode {
    let targets = targets
        .into_iter()
        .map(|(alias, expr)| (alias.map(str::to_string), expr))
        .collect();
    RenderNode::new(Box::new(table_rows()), Some("t"), targets).unwrap()
}

fn resolve(node: &mut dyn PlanNode, clause: &[Order]) -> Result<Option<SortPlan>, PlannerError> {
    let catalog = catalog();
    OrderByResolver::new(&catalog).order_by(clause, node)
}

fn resolve_ok(node: &mut dyn PlanNode, clause: &[Order]) -> SortPlan {
    resolve(node, clause).unwrap().expect("ordering expected")
}

// =============================================================================
// Ordinal Tests
// =============================================================================

/// ORDER BY 1 sorts by the first output column.
#[test]
fn test_ordinal_resolves_to_column() {
    let mut node = select(vec![(None, Expr::column("x")), (None, Expr::column("y"))]);
    let plan = resolve_ok(&mut node, &[Order::desc(Expr::num("2"))]);
    assert_eq!(plan.ordering, vec![ColumnOrderInfo::desc(1)]);
}

/// Ordinals outside [1, number of select columns] are rejected.
#[test]
fn test_ordinal_out_of_range() {
    for ordinal in ["0", "3"] {
        let mut node = select(vec![(None, Expr::column("x")), (None, Expr::column("y"))]);
        let err = resolve(&mut node, &[Order::asc(Expr::num(ordinal))]).unwrap_err();
        assert_eq!(err.code().code(), "AERO_ORDER_BY_POSITION_OUT_OF_RANGE");
        assert_eq!(
            err.message(),
            format!("ORDER BY position {} is not in select list", ordinal)
        );
    }
}

/// Hidden columns added by earlier items do not widen the ordinal range.
#[test]
fn test_hidden_columns_not_addressable_by_ordinal() {
    let mut node = select(vec![(None, Expr::column("x"))]);
    let err = resolve(
        &mut node,
        &[Order::asc(Expr::column("y")), Order::asc(Expr::num("2"))],
    )
    .unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_POSITION_OUT_OF_RANGE");
}

/// String, float and NULL constants are not positions.
#[test]
fn test_non_integer_constants_rejected() {
    for expr in [Expr::Str("x".into()), Expr::num("1.5"), Expr::Float(2.0), Expr::Null] {
        let mut node = table_rows();
        let err = resolve(&mut node, &[Order::asc(expr)]).unwrap_err();
        assert_eq!(err.code().code(), "AERO_ORDER_BY_NON_INTEGER");
        assert!(err.message().starts_with("non-integer constant in ORDER BY: "));
    }
}

/// Digits beyond the int64 range are a non-integer constant, not a position.
#[test]
fn test_ordinal_overflowing_int64_is_non_integer() {
    let mut node = select(vec![(None, Expr::column("x"))]);
    let err = resolve(&mut node, &[Order::asc(Expr::num("99999999999999999999"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_NON_INTEGER");
    assert_eq!(
        err.message(),
        "non-integer constant in ORDER BY: 99999999999999999999"
    );
}

// =============================================================================
// Alias Tests
// =============================================================================

/// SELECT x AS b FROM t ORDER BY b uses the alias, adding nothing.
#[test]
fn test_alias_match() {
    let mut node = select(vec![(Some("b"), Expr::column("x"))]);
    let plan = resolve_ok(&mut node, &[Order::asc(Expr::column("B"))]);

    assert_eq!(plan.ordering, vec![ColumnOrderInfo::asc(0)]);
    assert_eq!(node.columns().len(), 1);
}

/// SELECT y, * FROM t ORDER BY y: both matches compute t.y.
#[test]
fn test_duplicate_equivalent_alias_uses_first() {
    let mut node = select(vec![(None, Expr::column("y")), (None, Expr::Star(None))]);
    let plan = resolve_ok(&mut node, &[Order::desc(Expr::column("y"))]);
    assert_eq!(plan.ordering, vec![ColumnOrderInfo::desc(0)]);
}

/// SELECT x AS z, y AS z FROM t ORDER BY z is ambiguous.
#[test]
fn test_ambiguous_alias() {
    let mut node = select(vec![
        (Some("z"), Expr::column("x")),
        (Some("z"), Expr::column("y")),
    ]);
    let err = resolve(&mut node, &[Order::asc(Expr::column("z"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_AMBIGUOUS");
    assert_eq!(err.message(), "ORDER BY \"z\" is ambiguous");
}

/// A qualified name never matches an alias.
#[test]
fn test_qualified_name_skips_alias() {
    let mut node = select(vec![(Some("x"), Expr::column("k"))]);
    let plan = resolve_ok(&mut node, &[Order::asc(Expr::qualified("t", "x"))]);

    assert_eq!(plan.ordering, vec![ColumnOrderInfo::asc(1)]);
    assert!(node.columns()[1].hidden);
}

// =============================================================================
// Render Tests
// =============================================================================

/// Expressions absent from the select list become hidden columns.
#[test]
fn test_expression_rendered_as_hidden_column() {
    let mut node = select(vec![(None, Expr::column("y"))]);
    let expr = Expr::binary(BinaryOp::Mult, Expr::column("x"), Expr::num("2"));
    let plan = resolve_ok(&mut node, &[Order::desc(expr)]);

    assert_eq!(plan.columns.len(), 1);
    assert_eq!(plan.ordering, vec![ColumnOrderInfo::desc(1)]);
    assert_eq!(node.columns()[1].name, "x * 2");
}

/// An expression already computed by the select list is reused.
#[test]
fn test_existing_render_reused() {
    let sum = || Expr::binary(BinaryOp::Plus, Expr::column("k"), Expr::column("x"));
    let mut node = select(vec![(None, Expr::column("y")), (None, sum())]);
    let plan = resolve_ok(&mut node, &[Order::asc(Expr::Paren(Box::new(sum())))]);

    assert_eq!(plan.ordering, vec![ColumnOrderInfo::asc(1)]);
    assert_eq!(node.columns().len(), 2);
}

/// Unknown columns are reported by name.
#[test]
fn test_unknown_column() {
    let mut node = select(vec![(None, Expr::column("x"))]);
    let err = resolve(&mut node, &[Order::asc(Expr::column("nope"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNKNOWN_COLUMN");
}

/// A VALUES list has no render capability.
#[test]
fn test_values_cannot_add_columns() {
    let mut node = table_rows();
    let err = resolve(&mut node, &[Order::asc(Expr::qualified("t", "x"))]).unwrap_err();
    assert_eq!(err.message(), "column t.x does not exist");
}

// =============================================================================
// Index Expansion Tests
// =============================================================================

/// ORDER BY INDEX t@idx DESC flips every stored direction.
#[test]
fn test_index_desc_expansion() {
    let mut node = RenderNode::star(Box::new(table_rows()), Some("t")).unwrap();
    let clause = [Order::index("t", "idx").with_direction(SortDirection::Desc)];
    let plan = resolve_ok(&mut node, &clause);

    assert_eq!(
        plan.ordering,
        vec![ColumnOrderInfo::desc(1), ColumnOrderInfo::asc(2)]
    );
}

/// ORDER BY PRIMARY KEY t uses the primary index columns.
#[test]
fn test_primary_key_expansion() {
    let mut node = select(vec![(None, Expr::column("y"))]);
    let plan = resolve_ok(&mut node, &[Order::primary_key("t")]);

    assert_eq!(plan.ordering, vec![ColumnOrderInfo::asc(1)]);
    assert_eq!(node.columns()[1].name, "k");
    assert!(node.columns()[1].hidden);
}

/// Unknown tables and indexes are rejected before any column is resolved.
#[test]
fn test_unknown_index_and_table() {
    let mut node = RenderNode::star(Box::new(table_rows()), Some("t")).unwrap();

    let err = resolve(&mut node, &[Order::index("t", "missing")]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNKNOWN_INDEX");

    let err = resolve(&mut node, &[Order::primary_key("other")]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNKNOWN_TABLE");
    assert_eq!(err.message(), "table \"other\" does not exist");
}

/// The clause decodes from JSON in the same shape the CLI reads.
#[test]
fn test_clause_from_json() {
    let clause: Vec<Order> = serde_json::from_value(json!([
        {"index": {"table": "t", "index": "idx"}},
        {"expr": {"num_val": "1"}, "direction": "desc"}
    ]))
    .unwrap();

    let mut node = RenderNode::star(Box::new(table_rows()), Some("t")).unwrap();
    let plan = resolve_ok(&mut node, &clause);
    assert_eq!(
        plan.ordering,
        vec![
            ColumnOrderInfo::asc(1),
            ColumnOrderInfo::desc(2),
            ColumnOrderInfo::desc(0),
        ]
    );
}

// =============================================================================
// Orderability Tests
// =============================================================================

/// Array columns are rejected whichever path finds them.
#[test]
fn test_array_column_rejected_on_every_path() {
    // alias
    let mut node = select(vec![(None, Expr::column("tags"))]);
    let err = resolve(&mut node, &[Order::asc(Expr::column("tags"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNORDERABLE_TYPE");

    // ordinal
    let mut node = select(vec![(None, Expr::column("tags"))]);
    let err = resolve(&mut node, &[Order::asc(Expr::num("1"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNORDERABLE_TYPE");

    // render
    let mut node = select(vec![(None, Expr::column("k"))]);
    let err = resolve(&mut node, &[Order::asc(Expr::qualified("t", "tags"))]).unwrap_err();
    assert_eq!(err.code().code(), "AERO_ORDER_BY_UNORDERABLE_TYPE");
    assert_eq!(err.message(), "can't order by column type INT[]");

    // star
    let mut node = select(vec![(None, Expr::column("k"))]);
    assert!(resolve(&mut node, &[Order::asc(Expr::Star(None))]).is_err());
}

/// An empty clause needs no sort at all.
#[test]
fn test_empty_clause() {
    let mut node = table_rows();
    assert!(resolve(&mut node, &[]).unwrap().is_none());
}

/// A wildcard over an input with no columns contributes nothing.
#[test]
fn test_wildcard_over_no_columns_is_skipped() {
    let empty = || {
        RenderNode::new(
            Box::new(ValuesNode::new(vec![])),
            Some("e"),
            vec![(None, Expr::num("7"))],
        )
        .unwrap()
    };

    let mut node = empty();
    assert!(resolve(&mut node, &[Order::asc(Expr::Star(None))])
        .unwrap()
        .is_none());
    assert_eq!(node.columns().len(), 1);

    let mut node = empty();
    let plan = resolve_ok(
        &mut node,
        &[Order::desc(Expr::Star(None)), Order::asc(Expr::num("1"))],
    );
    assert_eq!(plan.ordering, vec![ColumnOrderInfo::asc(0)]);
}
