//! Projection operator
//!
//! Computes its output columns from the rows of a single input. It is the
//! only operator that can grow hidden columns when an ORDER BY item names an
//! expression that is not already in the select list.

use crate::planner::{normalize_name, BinaryOp, Expr, PlannerError, PlannerResult};
use crate::schema::{Datum, DatumType, ResultColumn, ResultColumns, Row};

use super::context::ExecContext;
use super::errors::{ExecutorError, ExecutorResult};
use super::plan_node::{PlanNode, RenderTarget, ValueIterator};

/// Type-checked render expression over the input row
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    /// Input column by position
    Input(usize),
    Const(Datum),
    Binary {
        op: BinaryOp,
        left: Box<Scalar>,
        right: Box<Scalar>,
    },
}

impl Scalar {
    fn eval(&self, row: &[Datum]) -> ExecutorResult<Datum> {
        match self {
            Scalar::Input(idx) => row.get(*idx).cloned().ok_or_else(|| {
                ExecutorError::execution_failed(format!(
                    "input row has {} columns, render reads column {}",
                    row.len(),
                    idx
                ))
            }),
            Scalar::Const(d) => Ok(d.clone()),
            Scalar::Binary { op, left, right } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                eval_binary(*op, &l, &r)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, l: &Datum, r: &Datum) -> ExecutorResult<Datum> {
    match (l, r) {
        (Datum::Null, _) | (_, Datum::Null) => Ok(Datum::Null),
        (Datum::Int(a), Datum::Int(b)) => {
            let out = match op {
                BinaryOp::Plus => a.checked_add(*b),
                BinaryOp::Minus => a.checked_sub(*b),
                BinaryOp::Mult => a.checked_mul(*b),
                BinaryOp::Div => {
                    if *b == 0 {
                        return Err(ExecutorError::execution_failed("division by zero"));
                    }
                    a.checked_div(*b)
                }
            };
            out.map(Datum::Int)
                .ok_or_else(|| ExecutorError::execution_failed("integer out of range"))
        }
        _ => {
            let (a, b) = match (as_float(l), as_float(r)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(ExecutorError::execution_failed(format!(
                        "unsupported operands {} {} {}",
                        l,
                        op.symbol(),
                        r
                    )))
                }
            };
            let out = match op {
                BinaryOp::Plus => a + b,
                BinaryOp::Minus => a - b,
                BinaryOp::Mult => a * b,
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(ExecutorError::execution_failed("division by zero"));
                    }
                    a / b
                }
            };
            Ok(Datum::Float(out))
        }
    }
}

fn as_float(d: &Datum) -> Option<f64> {
    match d {
        Datum::Int(i) => Some(*i as f64),
        Datum::Float(f) => Some(*f),
        _ => None,
    }
}

/// One computed output column, ready to be added to a [`RenderNode`]
#[derive(Debug, Clone)]
pub struct Render {
    column: ResultColumn,
    scalar: Scalar,
}

impl Render {
    /// Output column the render would produce
    pub fn column(&self) -> &ResultColumn {
        &self.column
    }
}

/// Projection over a single input
pub struct RenderNode {
    source: Box<dyn PlanNode>,
    /// Normalized name of the input table, for qualified column references
    table: Option<String>,
    renders: Vec<Scalar>,
    columns: ResultColumns,
    num_original_cols: usize,
    row: Row,
}

impl RenderNode {
    /// Projects every input column, as `SELECT *` does
    pub fn star(source: Box<dyn PlanNode>, table: Option<&str>) -> PlannerResult<Self> {
        Self::new(source, table, vec![(None, Expr::Star(None))])
    }

    /// Builds a projection of `targets`, each an optional alias plus an
    /// expression over the input columns.
    pub fn new(
        source: Box<dyn PlanNode>,
        table: Option<&str>,
        targets: Vec<(Option<String>, Expr)>,
    ) -> PlannerResult<Self> {
        let mut node = Self {
            source,
            table: table.map(normalize_name),
            renders: Vec::new(),
            columns: ResultColumns::new(),
            num_original_cols: 0,
            row: Row::new(),
        };
        for (alias, expr) in targets {
            let mut renders = node.compute(&expr)?;
            if let Some(alias) = alias {
                if renders.len() != 1 {
                    return Err(PlannerError::query_invalid(format!(
                        "cannot alias \"{}\" as \"{}\"",
                        expr, alias
                    )));
                }
                renders[0].column.name = normalize_name(&alias);
            }
            for render in renders {
                node.renders.push(render.scalar);
                node.columns.push(render.column);
            }
        }
        node.num_original_cols = node.columns.len();
        Ok(node)
    }

    fn table_matches(&self, qualifier: &str) -> bool {
        self.table.as_deref() == Some(normalize_name(qualifier).as_str())
    }

    fn compute(&self, expr: &Expr) -> PlannerResult<Vec<Render>> {
        match expr.strip_parens() {
            Expr::Star(qualifier) => {
                if let Some(q) = qualifier {
                    if !self.table_matches(q) {
                        return Err(PlannerError::query_invalid(format!(
                            "no data source matches pattern: {}",
                            expr
                        )));
                    }
                }
                Ok(self
                    .source
                    .columns()
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.hidden)
                    .map(|(idx, c)| Render {
                        column: ResultColumn::new(c.name.clone(), c.typ.clone()),
                        scalar: Scalar::Input(idx),
                    })
                    .collect())
            }
            inner => {
                let (scalar, typ) = self.compile(inner)?;
                let name = match inner {
                    Expr::Column(c) => c.normalized_name(),
                    other => other.to_string(),
                };
                Ok(vec![Render {
                    column: ResultColumn::new(name, typ),
                    scalar,
                }])
            }
        }
    }

    fn compile(&self, expr: &Expr) -> PlannerResult<(Scalar, DatumType)> {
        match expr {
            Expr::Column(item) => {
                if let Some(t) = &item.table {
                    if !self.table_matches(t) {
                        return Err(PlannerError::unknown_column(expr.to_string()));
                    }
                }
                let name = item.normalized_name();
                self.source
                    .columns()
                    .iter()
                    .position(|c| !c.hidden && c.name == name)
                    .map(|idx| {
                        let typ = self.source.columns()[idx].typ.clone();
                        (Scalar::Input(idx), typ)
                    })
                    .ok_or_else(|| PlannerError::unknown_column(expr.to_string()))
            }
            Expr::Star(_) => Err(PlannerError::query_invalid(format!(
                "cannot use \"{}\" in this context",
                expr
            ))),
            Expr::NumVal(text) => {
                if let Ok(i) = text.parse::<i64>() {
                    Ok((Scalar::Const(Datum::Int(i)), DatumType::Int))
                } else if let Ok(f) = text.parse::<f64>() {
                    Ok((Scalar::Const(Datum::Float(f)), DatumType::Float))
                } else {
                    Err(PlannerError::query_invalid(format!(
                        "invalid numeric literal {}",
                        text
                    )))
                }
            }
            Expr::Int(i) => Ok((Scalar::Const(Datum::Int(*i)), DatumType::Int)),
            Expr::Float(f) => Ok((Scalar::Const(Datum::Float(*f)), DatumType::Float)),
            Expr::Str(s) => Ok((Scalar::Const(Datum::String(s.clone())), DatumType::String)),
            Expr::Bool(b) => Ok((Scalar::Const(Datum::Bool(*b)), DatumType::Bool)),
            Expr::Null => Err(PlannerError::query_invalid(
                "cannot determine the type of NULL",
            )),
            Expr::Paren(inner) => self.compile(inner),
            Expr::Binary { op, left, right } => {
                let (l, lt) = self.compile(left)?;
                let (r, rt) = self.compile(right)?;
                if !lt.is_numeric() || !rt.is_numeric() {
                    return Err(PlannerError::query_invalid(format!(
                        "unsupported binary operator: <{}> {} <{}>",
                        lt,
                        op.symbol(),
                        rt
                    )));
                }
                let typ = if lt == DatumType::Int && rt == DatumType::Int {
                    DatumType::Int
                } else {
                    DatumType::Float
                };
                Ok((
                    Scalar::Binary {
                        op: *op,
                        left: Box::new(l),
                        right: Box::new(r),
                    },
                    typ,
                ))
            }
        }
    }
}

impl ValueIterator for RenderNode {
    fn next(&mut self, ctx: &ExecContext) -> ExecutorResult<bool> {
        if !self.source.next(ctx)? {
            self.row.clear();
            return Ok(false);
        }
        let input = self.source.values();
        self.row = self
            .renders
            .iter()
            .map(|r| r.eval(input))
            .collect::<ExecutorResult<Row>>()?;
        Ok(true)
    }

    fn values(&self) -> &[Datum] {
        &self.row
    }

    fn close(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        self.row.clear();
        self.source.close(ctx)
    }
}

impl PlanNode for RenderNode {
    fn start(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        self.source.start(ctx)
    }

    fn columns(&self) -> &ResultColumns {
        &self.columns
    }

    fn name(&self) -> &'static str {
        "render"
    }

    fn as_render(&self) -> Option<&dyn RenderTarget> {
        Some(self)
    }

    fn as_render_mut(&mut self) -> Option<&mut dyn RenderTarget> {
        Some(self)
    }
}

impl RenderTarget for RenderNode {
    fn num_original_cols(&self) -> usize {
        self.num_original_cols
    }

    fn render_columns(&self) -> &ResultColumns {
        &self.columns
    }

    fn equivalent_renders(&self, i: usize, j: usize) -> bool {
        match (self.renders.get(i), self.renders.get(j)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn compute_renders(&self, expr: &Expr) -> PlannerResult<Vec<Render>> {
        self.compute(expr)
    }

    fn add_or_reuse_renders(&mut self, renders: Vec<Render>) -> Vec<usize> {
        renders
            .into_iter()
            .map(|render| {
                if let Some(pos) = self.renders.iter().position(|s| *s == render.scalar) {
                    return pos;
                }
                self.renders.push(render.scalar);
                self.columns.push(ResultColumn {
                    hidden: true,
                    ..render.column
                });
                self.renders.len() - 1
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ValuesNode;

    fn source() -> Box<dyn PlanNode> {
        Box::new(
            ValuesNode::from_rows(
                vec![
                    ResultColumn::new("a", DatumType::Int),
                    ResultColumn::new("b", DatumType::Int),
                    ResultColumn::new("s", DatumType::String),
                ],
                vec![
                    vec![Datum::Int(1), Datum::Int(10), Datum::String("x".into())],
                    vec![Datum::Int(2), Datum::Int(20), Datum::Null],
                ],
            )
            .unwrap(),
        )
    }

    fn drain(node: &mut RenderNode) -> Vec<Vec<Datum>> {
        let ctx = ExecContext::new();
        node.start(&ctx).unwrap();
        let mut out = Vec::new();
        while node.next(&ctx).unwrap() {
            out.push(node.values().to_vec());
        }
        out
    }

    #[test]
    fn test_star_projects_every_column() {
        let node = RenderNode::star(source(), Some("t")).unwrap();
        let names: Vec<_> = node.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "s"]);
        assert_eq!(node.num_original_cols(), 3);
    }

    #[test]
    fn test_alias_and_arithmetic() {
        let mut node = RenderNode::new(
            source(),
            Some("t"),
            vec![
                (Some("B".into()), Expr::column("a")),
                (None, Expr::binary(BinaryOp::Plus, Expr::column("a"), Expr::qualified("t", "b"))),
            ],
        )
        .unwrap();
        assert_eq!(node.columns()[0].name, "b");
        assert_eq!(node.columns()[1].name, "a + t.b");
        assert_eq!(
            drain(&mut node),
            vec![
                vec![Datum::Int(1), Datum::Int(11)],
                vec![Datum::Int(2), Datum::Int(22)],
            ]
        );
    }

    #[test]
    fn test_unknown_column_and_table() {
        let err = RenderNode::new(source(), Some("t"), vec![(None, Expr::column("zz"))])
            .err()
            .unwrap();
        assert_eq!(err.code().code(), "AERO_ORDER_BY_UNKNOWN_COLUMN");

        assert!(RenderNode::new(source(), Some("t"), vec![(None, Expr::qualified("u", "a"))]).is_err());
    }

    #[test]
    fn test_non_numeric_arithmetic_rejected() {
        let expr = Expr::binary(BinaryOp::Plus, Expr::column("s"), Expr::num("1"));
        let err = RenderNode::new(source(), None, vec![(None, expr)]).err().unwrap();
        assert_eq!(err.code().code(), "AERO_QUERY_INVALID");
    }

    #[test]
    fn test_add_or_reuse_renders() {
        let mut node = RenderNode::new(source(), Some("t"), vec![(None, Expr::column("a"))]).unwrap();

        let reused = node.compute_renders(&Expr::qualified("t", "a")).unwrap();
        assert_eq!(node.add_or_reuse_renders(reused), vec![0]);

        let added = node.compute_renders(&Expr::column("b")).unwrap();
        assert_eq!(node.add_or_reuse_renders(added), vec![1]);
        assert!(node.columns()[1].hidden);
        assert_eq!(node.num_original_cols(), 1);
        assert_eq!(drain(&mut node)[1], vec![Datum::Int(2), Datum::Int(20)]);
    }

    #[test]
    fn test_equivalent_renders() {
        let node = RenderNode::new(
            source(),
            None,
            vec![
                (None, Expr::column("b")),
                (None, Expr::column("a")),
                (Some("c".into()), Expr::Paren(Box::new(Expr::column("b")))),
            ],
        )
        .unwrap();
        assert!(node.equivalent_renders(0, 2));
        assert!(!node.equivalent_renders(0, 1));
        assert!(!node.equivalent_renders(0, 9));
    }

    #[test]
    fn test_division_by_zero_fails_at_execution() {
        let expr = Expr::binary(BinaryOp::Div, Expr::column("a"), Expr::num("0"));
        let mut node = RenderNode::new(source(), None, vec![(None, expr)]).unwrap();
        let ctx = ExecContext::new();
        node.start(&ctx).unwrap();
        let err = node.next(&ctx).unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }
}
