//! ORDER BY resolution
//!
//! Turns a parsed ORDER BY clause into a [`ColumnOrdering`] over the output
//! columns of the node being sorted. Each item is tried, in order, as:
//!
//! 1. an `INDEX`/`PRIMARY KEY` item, expanded up front into one qualified
//!    column item per index key column
//! 2. the alias of an output column (unqualified names only)
//! 3. a 1-based ordinal into the originally requested columns
//! 4. a new render added to the input, when the input can compute columns
//!
//! Every column ordered by must have an orderable type.

use crate::executor::PlanNode;
use crate::observability::{Logger, MetricsRegistry, Severity};
use crate::schema::{ColumnOrderInfo, ColumnOrdering, Direction, ResultColumn, ResultColumns};

use super::ast::{Expr, Order, OrderBy, OrderTarget, SortDirection};
use super::catalog::{Catalog, IndexDirection};
use super::errors::{PlannerError, PlannerResult};

/// A resolved ordering, ready to build a sort node from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPlan {
    /// Columns requested by the query, captured before any render was added.
    /// Sorted rows are truncated to this width.
    pub columns: ResultColumns,
    /// Ordering over the input's (possibly extended) columns
    pub ordering: ColumnOrdering,
}

/// Resolves ORDER BY clauses against plan nodes
pub struct OrderByResolver<'a> {
    catalog: &'a dyn Catalog,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a> OrderByResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            metrics: None,
        }
    }

    /// Reports resolution counters to `metrics`
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolves `clause` against the output of `node`.
    ///
    /// Returns `None` when no sort is needed: the clause is empty or every
    /// item expanded to nothing. May add hidden renders to `node`.
    pub fn order_by(
        &self,
        clause: &[Order],
        node: &mut dyn PlanNode,
    ) -> PlannerResult<Option<SortPlan>> {
        let result = self.resolve(clause, node);
        match &result {
            Ok(Some(plan)) => {
                if let Some(m) = self.metrics {
                    m.increment_orderings_resolved();
                }
                if Logger::enabled(Severity::Trace) {
                    Logger::trace(
                        "ORDER_BY_RESOLVED",
                        &[
                            ("node", node.name()),
                            ("ordering", &format_ordering(&plan.ordering)),
                            ("requested_columns", &plan.columns.len().to_string()),
                        ],
                    );
                }
            }
            Ok(None) => {}
            Err(err) => {
                if let Some(m) = self.metrics {
                    m.increment_resolutions_rejected();
                }
                Logger::info(
                    "ORDER_BY_REJECTED",
                    &[("code", err.code().code()), ("reason", err.message())],
                );
            }
        }
        result
    }

    fn resolve(
        &self,
        clause: &[Order],
        node: &mut dyn PlanNode,
    ) -> PlannerResult<Option<SortPlan>> {
        if clause.is_empty() {
            return Ok(None);
        }

        // Renders added below must not change what the query returns.
        let columns = node.columns().clone();
        let num_original_cols = node
            .as_render()
            .map_or(columns.len(), |r| r.num_original_cols());

        let clause = self.rewrite_index_orderings(clause)?;
        let mut ordering = ColumnOrdering::new();

        for order in &clause {
            let direction = match order.direction {
                SortDirection::Asc => Direction::Ascending,
                SortDirection::Desc => Direction::Descending,
            };
            let expr = match &order.target {
                OrderTarget::Expr(e) => e.strip_parens(),
                _ => {
                    return Err(PlannerError::unsupported(format!(
                        "unknown ORDER BY specification: {}",
                        order
                    )))
                }
            };

            let mut index = match_alias(expr, &columns, node)?;

            if index.is_none() {
                index = col_index(num_original_cols, expr)?;
            }

            if let Some(idx) = index {
                ensure_column_orderable(&columns[idx])?;
            }

            if index.is_none() {
                if let Some(render) = node.as_render_mut() {
                    let renders = render.compute_renders(expr)?;
                    let col_idxs = render.add_or_reuse_renders(renders);
                    let (last, rest) = match col_idxs.split_last() {
                        Some(split) => split,
                        // A wildcard over no columns orders by nothing.
                        None => continue,
                    };
                    for &col_idx in rest {
                        ordering.push(ColumnOrderInfo { col_idx, direction });
                    }
                    let render_cols = render.render_columns();
                    for &col_idx in &col_idxs {
                        ensure_column_orderable(&render_cols[col_idx])?;
                    }
                    index = Some(*last);
                }
            }

            match index {
                Some(col_idx) => ordering.push(ColumnOrderInfo { col_idx, direction }),
                None => return Err(PlannerError::unknown_column(expr.to_string())),
            }
        }

        if ordering.is_empty() {
            return Ok(None);
        }
        Ok(Some(SortPlan { columns, ordering }))
    }

    /// Replaces every `INDEX` and `PRIMARY KEY` item with one table-qualified
    /// column item per index key column.
    ///
    /// With an index `foo(a DESC, b ASC)` on `t`:
    /// - `INDEX t@foo` becomes `t.a DESC, t.b ASC`
    /// - `INDEX t@foo DESC` becomes `t.a ASC, t.b DESC`
    ///
    /// Expression items keep their relative position.
    pub fn rewrite_index_orderings(&self, clause: &[Order]) -> PlannerResult<OrderBy> {
        let mut rewritten = OrderBy::with_capacity(clause.len());
        let mut expanded = false;

        for order in clause {
            let (table, index) = match &order.target {
                OrderTarget::Expr(_) => {
                    rewritten.push(order.clone());
                    continue;
                }
                OrderTarget::Index { table, index } => (table, index.as_deref()),
                OrderTarget::PrimaryKey { table } => (table, None),
            };

            let desc = self.catalog.resolve_table(table)?;
            let idx = desc
                .find_index(index)
                .ok_or_else(|| PlannerError::unknown_index(table, index.unwrap_or("")))?;

            let invert = order.direction == SortDirection::Desc;
            for (pos, column) in idx.column_names.iter().enumerate() {
                rewritten.push(Order {
                    target: OrderTarget::Expr(Expr::qualified(desc.name.clone(), column.clone())),
                    direction: choose_direction(invert, idx.direction(pos)),
                });
            }
            expanded = true;
        }

        if expanded && Logger::enabled(Severity::Trace) {
            let text = rewritten
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Logger::trace("ORDER_BY_REWRITTEN", &[("order_by", &text)]);
        }
        Ok(rewritten)
    }
}

/// Direction of one expanded index column: the stored direction, flipped
/// when the whole index is traversed descending.
pub fn choose_direction(invert: bool, idx_dir: IndexDirection) -> SortDirection {
    if (idx_dir == IndexDirection::Asc) != invert {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    }
}

/// Looks `expr` up as an output column alias.
///
/// Several matches are tolerated only when they compute the same expression;
/// the first match wins.
fn match_alias(
    expr: &Expr,
    columns: &ResultColumns,
    node: &dyn PlanNode,
) -> PlannerResult<Option<usize>> {
    let item = match expr {
        Expr::Column(item) if item.table.is_none() => item,
        _ => return Ok(None),
    };
    let target = item.normalized_name();
    let mut index = None;
    for (j, col) in columns.iter().enumerate() {
        if col.hidden || col.name != target {
            continue;
        }
        match index {
            None => index = Some(j),
            Some(first) => {
                let equivalent = node
                    .as_render()
                    .map_or(false, |r| r.equivalent_renders(j, first));
                if !equivalent {
                    return Err(PlannerError::ambiguous(target));
                }
            }
        }
    }
    Ok(index)
}

/// Interprets `expr` as a 1-based column ordinal.
///
/// Returns the zero-based index, or `None` if `expr` is not an ordinal.
pub fn col_index(num_original_cols: usize, expr: &Expr) -> PlannerResult<Option<usize>> {
    let ord: i64 = match expr {
        Expr::NumVal(text) => {
            let digits = text.trim_start_matches(|c| c == '-' || c == '+');
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(PlannerError::non_integer(text.clone()));
            }
            // Digits that overflow int64 are not an integer constant at all.
            text.parse::<i64>()
                .map_err(|_| PlannerError::non_integer(text.clone()))?
        }
        Expr::Int(i) if *i >= 0 => *i,
        Expr::Int(_) => return Ok(None),
        Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null => {
            return Err(PlannerError::non_integer(expr.to_string()))
        }
        _ => return Ok(None),
    };
    if ord < 1 || ord as u64 > num_original_cols as u64 {
        return Err(PlannerError::position_out_of_range(expr.to_string()));
    }
    Ok(Some((ord - 1) as usize))
}

/// Rejects columns whose type has no total order
pub fn ensure_column_orderable(column: &ResultColumn) -> PlannerResult<()> {
    if !column.typ.is_orderable() {
        return Err(PlannerError::unorderable_type(&column.name, &column.typ));
    }
    Ok(())
}

fn format_ordering(ordering: &ColumnOrdering) -> String {
    ordering
        .iter()
        .map(|o| format!("{} {}", o.col_idx, o.direction.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
