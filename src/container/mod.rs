//! Row storage for sorting strategies
//!
//! A [`RowContainer`] is created empty by a sorting strategy, grows during
//! ingestion, is sorted or drained during finalization and is dropped when
//! the strategy closes.

pub mod heap;
mod row_container;

pub use heap::HeapOps;
pub use row_container::{HeapMode, RowContainer};
