//! Fully materialized row source
//!
//! Backed by a [`RowContainer`], so a sort above it can reorder the rows in
//! place instead of copying them into a sorting strategy.

use crate::container::RowContainer;
use crate::schema::{ColumnOrdering, Datum, ResultColumns, Row};

use super::context::ExecContext;
use super::errors::ExecutorResult;
use super::plan_node::{PlanNode, ValueIterator};

/// A literal list of rows, e.g. a VALUES clause
#[derive(Debug)]
pub struct ValuesNode {
    columns: ResultColumns,
    rows: RowContainer,
    /// Number of rows already returned by `next`
    cursor: usize,
}

impl ValuesNode {
    /// Creates an empty values list
    pub fn new(columns: ResultColumns) -> Self {
        let rows = RowContainer::new(&columns, ColumnOrdering::new());
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }

    /// Creates a values list holding `rows`.
    ///
    /// Fails if any row does not match `columns`.
    pub fn from_rows(columns: ResultColumns, rows: Vec<Row>) -> ExecutorResult<Self> {
        let mut node = Self::new(columns);
        for row in &rows {
            node.push(row)?;
        }
        Ok(node)
    }

    /// Appends a copy of one row
    pub fn push(&mut self, values: &[Datum]) -> ExecutorResult<()> {
        self.rows.append(values)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reorders the rows in place. Stable for rows equal under `ordering`.
    pub fn sort(&mut self, ordering: &ColumnOrdering) {
        self.rows.set_ordering(ordering.clone());
        self.rows.sort_all();
    }
}

impl ValueIterator for ValuesNode {
    fn next(&mut self, ctx: &ExecContext) -> ExecutorResult<bool> {
        ctx.check_cancelled()?;
        if self.cursor >= self.rows.len() {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }

    fn values(&self) -> &[Datum] {
        if self.cursor == 0 || self.cursor > self.rows.len() {
            return &[];
        }
        self.rows.at(self.cursor - 1)
    }

    fn close(&mut self, _ctx: &ExecContext) -> ExecutorResult<()> {
        self.rows.clear();
        self.cursor = 0;
        Ok(())
    }
}

impl PlanNode for ValuesNode {
    fn start(&mut self, _ctx: &ExecContext) -> ExecutorResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn columns(&self) -> &ResultColumns {
        &self.columns
    }

    fn name(&self) -> &'static str {
        "values"
    }

    fn as_values_mut(&mut self) -> Option<&mut ValuesNode> {
        Some(self)
    }
}
