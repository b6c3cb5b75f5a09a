//! Row container backing every sorting strategy
//!
//! One owned, growable buffer of rows that can be read as a plain sequence,
//! sorted in place, or maintained as a min-heap or max-heap under the active
//! ordering. Rows are deep-copied on ingestion so no two pulls ever share a
//! buffer.

use std::cmp::Ordering;

use crate::executor::{ExecutorError, ExecutorResult};
use crate::schema::{compare_rows, ColumnOrdering, Datum, DatumType, ResultColumns, Row};

use super::heap::{self, HeapOps};

/// Rows sorted per run before merging in [`RowContainer::sort_all_checked`]
const SORT_RUN_LEN: usize = 4096;

/// Direction of the heap comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapMode {
    /// Root is the smallest row under the ordering
    Min,
    /// Root is the largest row under the ordering (comparison sign reversed)
    Max,
}

/// Owned row storage with sequence and heap access modes
#[derive(Debug)]
pub struct RowContainer {
    /// Column types every stored row must match
    types: Vec<DatumType>,
    ordering: ColumnOrdering,
    mode: HeapMode,
    rows: Vec<Row>,
    /// Logical length; rows past it stay in `rows` until reset or overwritten
    len: usize,
    memory_used: usize,
    memory_budget: Option<usize>,
}

impl RowContainer {
    /// Creates an empty container for rows shaped like `columns`
    pub fn new(columns: &ResultColumns, ordering: ColumnOrdering) -> Self {
        Self {
            types: columns.iter().map(|c| c.typ.clone()).collect(),
            ordering,
            mode: HeapMode::Min,
            rows: Vec::new(),
            len: 0,
            memory_used: 0,
            memory_budget: None,
        }
    }

    /// Caps the estimated bytes this container may hold
    pub fn with_memory_budget(mut self, budget: usize) -> Self {
        self.memory_budget = Some(budget);
        self
    }

    /// Logical number of rows
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Estimated bytes held by stored rows
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    pub fn ordering(&self) -> &ColumnOrdering {
        &self.ordering
    }

    /// Replaces the active ordering. Existing heap order is not restored.
    pub fn set_ordering(&mut self, ordering: ColumnOrdering) {
        self.ordering = ordering;
    }

    pub fn mode(&self) -> HeapMode {
        self.mode
    }

    /// Reads the row stored at `idx`.
    ///
    /// `idx` may point past the logical length to reach rows moved there by
    /// a heap pop.
    pub fn at(&self, idx: usize) -> &[Datum] {
        &self.rows[idx]
    }

    /// Deep-copies `values` onto the end of the container.
    ///
    /// Returns the index of the new row.
    pub fn append(&mut self, values: &[Datum]) -> ExecutorResult<usize> {
        let row = self.copy_row(values)?;
        let parked: usize = self.rows[self.len..].iter().map(|r| row_size(r)).sum();
        self.charge(row_size(&row), parked)?;
        self.rows.truncate(self.len);
        self.rows.push(row);
        self.len += 1;
        Ok(self.len - 1)
    }

    /// Overwrites the row at `idx` with a deep copy of `values`
    pub fn replace_at(&mut self, idx: usize, values: &[Datum]) -> ExecutorResult<()> {
        if idx >= self.len {
            return Err(ExecutorError::execution_failed(format!(
                "row index {} out of range for container of {} rows",
                idx, self.len
            )));
        }
        let row = self.copy_row(values)?;
        self.charge(row_size(&row), row_size(&self.rows[idx]))?;
        self.rows[idx] = row;
        Ok(())
    }

    /// Re-establishes a min-heap over the current rows in O(n)
    pub fn init_min_heap(&mut self) {
        self.mode = HeapMode::Min;
        heap::init(self);
    }

    /// Re-establishes a max-heap over the current rows in O(n)
    pub fn init_max_heap(&mut self) {
        self.mode = HeapMode::Max;
        heap::init(self);
    }

    /// Appends `values` and sifts the new row into heap position
    pub fn push_heap(&mut self, values: &[Datum]) -> ExecutorResult<()> {
        let idx = self.append(values)?;
        heap::up(self, idx);
        Ok(())
    }

    /// Removes the heap root from the logical range.
    ///
    /// The popped row is parked just past the new logical end; the returned
    /// index addresses it via [`RowContainer::at`].
    pub fn pop_heap(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let last = self.len - 1;
        self.swap(0, last);
        heap::down(self, 0, last);
        self.len = last;
        Some(last)
    }

    /// Restores heap order after the row at `idx` was replaced
    pub fn fix(&mut self, idx: usize) {
        heap::fix(self, idx);
    }

    /// Reports whether an incoming row sorts strictly before the stored row
    /// `idx` under the ordering. The heap mode does not apply.
    pub fn values_less(&self, values: &[Datum], idx: usize) -> bool {
        compare_rows(&self.ordering, values, &self.rows[idx]) == Ordering::Less
    }

    /// Sorts the logical range ascending under the ordering.
    ///
    /// The sort is stable: rows equal on every ordering column keep their
    /// ingestion order.
    pub fn sort_all(&mut self) {
        let ordering = &self.ordering;
        self.rows[..self.len].sort_by(|a, b| compare_rows(ordering, a, b));
    }

    /// Stable sort of the logical range that calls `check` between runs and
    /// between merges, stopping at its first error.
    ///
    /// On error every row is still stored, only partially ordered.
    pub fn sort_all_checked<F>(&mut self, mut check: F) -> ExecutorResult<()>
    where
        F: FnMut() -> ExecutorResult<()>,
    {
        let len = self.len;
        let mut start = 0;
        while start < len {
            check()?;
            let end = (start + SORT_RUN_LEN).min(len);
            let ordering = &self.ordering;
            self.rows[start..end].sort_by(|a, b| compare_rows(ordering, a, b));
            start = end;
        }

        let mut width = SORT_RUN_LEN;
        while width < len {
            let mut lo = 0;
            while lo + width < len {
                check()?;
                let mid = lo + width;
                let hi = (mid + width).min(len);
                self.merge_runs(lo, mid, hi);
                lo = hi;
            }
            width *= 2;
        }
        Ok(())
    }

    /// Merges the sorted runs `[lo, mid)` and `[mid, hi)`; ties keep the
    /// left run first.
    fn merge_runs(&mut self, lo: usize, mid: usize, hi: usize) {
        let right: Vec<Row> = self.rows.drain(mid..hi).collect();
        let left: Vec<Row> = self.rows.drain(lo..mid).collect();
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        let mut merged = Vec::with_capacity(hi - lo);
        loop {
            let take_right = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => compare_rows(&self.ordering, r, l) == Ordering::Less,
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => break,
            };
            let row = if take_right { right.next() } else { left.next() };
            merged.extend(row);
        }
        self.rows.splice(lo..lo, merged).for_each(drop);
    }

    /// Makes every stored row logically visible again
    pub fn reset_len(&mut self) {
        self.len = self.rows.len();
    }

    /// Drops all rows and releases their memory
    pub fn clear(&mut self) {
        self.rows = Vec::new();
        self.len = 0;
        self.memory_used = 0;
    }

    fn mode_less(&self, ordering: Ordering) -> bool {
        match self.mode {
            HeapMode::Min => ordering == Ordering::Less,
            HeapMode::Max => ordering == Ordering::Greater,
        }
    }

    /// Checks that `values` has the container's arity and column types
    pub fn check_row(&self, values: &[Datum]) -> ExecutorResult<()> {
        if values.len() != self.types.len() {
            return Err(ExecutorError::execution_failed(format!(
                "row has {} columns, expected {}",
                values.len(),
                self.types.len()
            )));
        }
        for (pos, (value, typ)) in values.iter().zip(self.types.iter()).enumerate() {
            if !value.fits(typ) {
                return Err(ExecutorError::execution_failed(format!(
                    "value {} at position {} does not match column type {}",
                    value, pos, typ
                )));
            }
        }
        Ok(())
    }

    fn copy_row(&self, values: &[Datum]) -> ExecutorResult<Row> {
        self.check_row(values)?;
        Ok(values.to_vec())
    }

    fn charge(&mut self, added: usize, released: usize) -> ExecutorResult<()> {
        let next = (self.memory_used + added).saturating_sub(released);
        if let Some(budget) = self.memory_budget {
            if next > budget {
                return Err(ExecutorError::execution_limit(format!(
                    "sort memory budget of {} bytes exceeded",
                    budget
                )));
            }
        }
        self.memory_used = next;
        Ok(())
    }
}

impl HeapOps for RowContainer {
    fn len(&self) -> usize {
        self.len
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.mode_less(compare_rows(&self.ordering, &self.rows[i], &self.rows[j]))
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }
}

fn row_size(row: &[Datum]) -> usize {
    row.iter().map(Datum::size_bytes).sum()
}
