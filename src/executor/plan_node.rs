//! Pull-based operator protocol
//!
//! Every operator is driven as `start` → repeated `next`/`values` → `close`
//! by a single caller. `values` is only meaningful after `next` returned
//! `true` and stays valid until the following `next`.

use crate::planner::{Expr, PlannerResult};
use crate::schema::{Datum, ResultColumns};

use super::context::ExecContext;
use super::errors::ExecutorResult;
use super::render::Render;
use super::values::ValuesNode;

/// Iteration half of the operator protocol
pub trait ValueIterator {
    /// Advances to the next row. Returns false once exhausted.
    fn next(&mut self, ctx: &ExecContext) -> ExecutorResult<bool>;

    /// Current row
    fn values(&self) -> &[Datum];

    /// Releases resources. Safe to call once in any state.
    fn close(&mut self, ctx: &ExecContext) -> ExecutorResult<()>;
}

/// An operator in a plan tree
pub trait PlanNode: ValueIterator {
    /// Prepares the operator (and its inputs) for iteration
    fn start(&mut self, ctx: &ExecContext) -> ExecutorResult<()>;

    /// Output columns, including hidden ones
    fn columns(&self) -> &ResultColumns;

    /// Short operator name for explain output and logs
    fn name(&self) -> &'static str;

    /// Fully materialized rows that can be sorted in place
    fn as_values_mut(&mut self) -> Option<&mut ValuesNode> {
        None
    }

    /// Projection capability, if the operator computes its own columns
    fn as_render(&self) -> Option<&dyn RenderTarget> {
        None
    }

    fn as_render_mut(&mut self) -> Option<&mut dyn RenderTarget> {
        None
    }
}

/// A projection that can grow extra (hidden) computed columns.
pub trait RenderTarget {
    /// Number of columns requested by the query, before any additions
    fn num_original_cols(&self) -> usize;

    /// Current output columns
    fn render_columns(&self) -> &ResultColumns;

    /// True if output columns `i` and `j` compute the same expression
    fn equivalent_renders(&self, i: usize, j: usize) -> bool;

    /// Type-checks `expr` against the input and returns the renders it
    /// expands to. A wildcard may expand to several renders or none.
    fn compute_renders(&self, expr: &Expr) -> PlannerResult<Vec<Render>>;

    /// Adds each render as a hidden column unless an equivalent one already
    /// exists. Returns the output column index of every render, in order.
    fn add_or_reuse_renders(&mut self, renders: Vec<Render>) -> Vec<usize>;
}
