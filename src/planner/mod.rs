//! ORDER BY planning
//!
//! Resolution runs once, at plan-construction time, before any row is
//! pulled. Malformed clauses are rejected here so that execution never does
//! wasted work.
//!
//! # Design Principles
//!
//! - Deterministic: same clause and input columns give the same ordering
//! - Eager: every resolution error is raised before execution
//! - Explicit: an empty ordering means the sort is dropped, never guessed

mod ast;
mod catalog;
mod errors;
mod explain;
mod order_by;

pub use ast::{
    normalize_name, BinaryOp, ColumnItem, Expr, Order, OrderBy, OrderTarget, SortDirection,
};
pub use catalog::{Catalog, IndexDescriptor, IndexDirection, MemoryCatalog, TableDescriptor};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use explain::{ExplainColumn, ExplainPlan};
pub use order_by::{choose_direction, col_index, ensure_column_orderable, OrderByResolver, SortPlan};
