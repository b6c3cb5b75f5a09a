//! Row and column model for sorting
//!
//! Rows are fixed-arity sequences of typed datums. Every row flowing
//! through a plan node matches that node's output column list in arity
//! and per-position type.

mod column;
mod datum;
mod ordering;
mod types;

pub use column::{ResultColumn, ResultColumns};
pub use datum::{Datum, Row};
pub use ordering::{compare_rows, ColumnOrderInfo, ColumnOrdering, Direction};
pub use types::DatumType;
