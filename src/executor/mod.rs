//! Sort execution subsystem
//!
//! Operators follow a pull protocol (`start`, `next`/`values`, `close`) and
//! compose into a tree. The sort operator drains its input into one of three
//! strategies on the first pull, then re-exposes the rows in order.
//!
//! # Execution Flow
//!
//! 1. Resolve the ORDER BY clause against the input (planner)
//! 2. Choose a strategy from the context's row-limit and consumption hints
//! 3. Pull every input row into the strategy, checking cancellation per row
//! 4. Finalize the strategy exactly once
//! 5. Return rows truncated to the requested columns
//!
//! # Guarantees
//!
//! - Rows are deep-copied on ingestion
//! - A failed sort returns no rows
//! - `close` releases the input and the strategy even if one of them fails

mod context;
mod errors;
mod plan_node;
mod render;
mod sort_node;
mod sorter;
mod values;

pub use context::{CancellationToken, ExecContext};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use plan_node::{PlanNode, RenderTarget, ValueIterator};
pub use render::{Render, RenderNode};
pub use sort_node::{SortNode, SortState};
pub use sorter::{
    FullSort, IncrementalHeapSort, SortStrategy, StrategyKind, StrategyState, TopKSort,
};
pub use values::ValuesNode;
