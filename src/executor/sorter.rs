//! Sorting strategies
//!
//! Three strategies share one contract: `add` every input row, call `finish`
//! exactly once, then read the rows back in order through `next`/`values`.
//!
//! | strategy    | time               | space | use when                         |
//! |-------------|--------------------|-------|----------------------------------|
//! | Full        | O(n log n)         | O(n)  | every row will be consumed       |
//! | Incremental | O(n + k log n)     | O(n)  | an unknown prefix is consumed    |
//! | TopK(k)     | O(n log k)         | O(k)  | exactly the smallest k are needed|

use crate::config::{SortConfig, StrategyName};
use crate::container::RowContainer;
use crate::schema::Datum;

use super::context::ExecContext;
use super::errors::{ExecutorError, ExecutorResult};
use super::plan_node::ValueIterator;

/// Lifecycle of a strategy instance. Never re-enters `Ingesting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    Ingesting,
    Finalized,
    Draining,
    Closed,
}

/// Which strategy to build for a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Full,
    Incremental,
    TopK(u64),
}

impl StrategyKind {
    /// Chooses a strategy from the planner hints carried by `ctx`.
    ///
    /// 1. a known row limit within `max_top_k` selects TopK
    /// 2. a partial-consumption hint selects Incremental
    /// 3. otherwise the configured default applies
    pub fn select(ctx: &ExecContext, config: &SortConfig) -> Self {
        if let Some(limit) = ctx.row_limit() {
            if limit <= config.max_top_k {
                return StrategyKind::TopK(limit);
            }
        }
        if ctx.partial_consumption() {
            return StrategyKind::Incremental;
        }
        match config.default_strategy {
            StrategyName::Full => StrategyKind::Full,
            StrategyName::Incremental => StrategyKind::Incremental,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Full => "full",
            StrategyKind::Incremental => "incremental",
            StrategyKind::TopK(_) => "top_k",
        }
    }
}

/// Sorts everything at `finish` and walks the result.
#[derive(Debug)]
pub struct FullSort {
    rows: RowContainer,
    state: StrategyState,
    /// Number of rows already returned by `next`
    cursor: usize,
}

impl FullSort {
    pub fn new(rows: RowContainer) -> Self {
        Self {
            rows,
            state: StrategyState::Ingesting,
            cursor: 0,
        }
    }

    fn add(&mut self, values: &[Datum]) -> ExecutorResult<()> {
        self.rows.append(values)?;
        Ok(())
    }

    fn finish(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        self.rows.sort_all_checked(|| ctx.check_cancelled())
    }

    fn next(&mut self) -> bool {
        if self.cursor >= self.rows.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn values(&self) -> &[Datum] {
        self.rows.at(self.cursor - 1)
    }
}

/// Heapifies at `finish` and pops one row per `next`.
#[derive(Debug)]
pub struct IncrementalHeapSort {
    rows: RowContainer,
    state: StrategyState,
    /// Storage index of the row most recently popped
    last: Option<usize>,
}

impl IncrementalHeapSort {
    pub fn new(rows: RowContainer) -> Self {
        Self {
            rows,
            state: StrategyState::Ingesting,
            last: None,
        }
    }

    fn add(&mut self, values: &[Datum]) -> ExecutorResult<()> {
        self.rows.append(values)?;
        Ok(())
    }

    fn finish(&mut self) {
        self.rows.init_min_heap();
    }

    fn next(&mut self) -> bool {
        self.last = self.rows.pop_heap();
        self.last.is_some()
    }

    fn values(&self) -> &[Datum] {
        match self.last {
            Some(idx) => self.rows.at(idx),
            None => &[],
        }
    }
}

/// Keeps the k smallest rows in a bounded max-heap during ingestion.
#[derive(Debug)]
pub struct TopKSort {
    rows: RowContainer,
    state: StrategyState,
    k: u64,
    cursor: usize,
    discarded: u64,
}

impl TopKSort {
    pub fn new(mut rows: RowContainer, k: u64) -> Self {
        rows.init_max_heap();
        Self {
            rows,
            state: StrategyState::Ingesting,
            k,
            cursor: 0,
            discarded: 0,
        }
    }

    /// Rows dropped because they could not be among the k smallest
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn add(&mut self, values: &[Datum]) -> ExecutorResult<()> {
        // Rejected rows fail here, never as a discard.
        self.rows.check_row(values)?;
        if (self.rows.len() as u64) < self.k {
            // The first k rows all go into the heap.
            return self.rows.push_heap(values);
        }
        if self.k > 0 && self.rows.values_less(values, 0) {
            // Heap is full: only a row sorting before the current maximum
            // may replace it.
            self.rows.replace_at(0, values)?;
            self.rows.fix(0);
        } else {
            self.discarded += 1;
        }
        Ok(())
    }

    fn finish(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        // Each pop parks the current maximum just past the shrinking heap,
        // so the storage ends up ascending in place.
        while self.rows.pop_heap().is_some() {
            ctx.check_cancelled()?;
        }
        self.rows.reset_len();
        Ok(())
    }

    fn next(&mut self) -> bool {
        if self.cursor >= self.rows.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn values(&self) -> &[Datum] {
        self.rows.at(self.cursor - 1)
    }
}

/// A sorting strategy, chosen once per sort and never switched.
#[derive(Debug)]
pub enum SortStrategy {
    Full(FullSort),
    Incremental(IncrementalHeapSort),
    TopK(TopKSort),
}

impl SortStrategy {
    /// Builds the strategy `kind` over an empty container
    pub fn new(kind: StrategyKind, rows: RowContainer) -> Self {
        match kind {
            StrategyKind::Full => SortStrategy::Full(FullSort::new(rows)),
            StrategyKind::Incremental => SortStrategy::Incremental(IncrementalHeapSort::new(rows)),
            StrategyKind::TopK(k) => SortStrategy::TopK(TopKSort::new(rows, k)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            SortStrategy::Full(_) => StrategyKind::Full,
            SortStrategy::Incremental(_) => StrategyKind::Incremental,
            SortStrategy::TopK(s) => StrategyKind::TopK(s.k),
        }
    }

    pub fn state(&self) -> StrategyState {
        *self.state_ref()
    }

    /// Rows currently held by the strategy
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows dropped during ingestion (non-zero only for TopK)
    pub fn discarded(&self) -> u64 {
        match self {
            SortStrategy::TopK(s) => s.discarded(),
            _ => 0,
        }
    }

    /// Ingests one row, deep-copying it if the strategy keeps it.
    ///
    /// Valid only before `finish`.
    pub fn add(&mut self, ctx: &ExecContext, values: &[Datum]) -> ExecutorResult<()> {
        if self.state() != StrategyState::Ingesting {
            return Err(ExecutorError::sort_protocol(format!(
                "add called on a {} sort after finish",
                self.kind().as_str()
            )));
        }
        ctx.check_cancelled()?;
        match self {
            SortStrategy::Full(s) => s.add(values),
            SortStrategy::Incremental(s) => s.add(values),
            SortStrategy::TopK(s) => s.add(values),
        }
    }

    /// Performs the strategy-specific finalization. Must be called exactly once.
    pub fn finish(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        if self.state() != StrategyState::Ingesting {
            return Err(ExecutorError::sort_protocol(format!(
                "finish called twice on a {} sort",
                self.kind().as_str()
            )));
        }
        ctx.check_cancelled()?;
        match self {
            SortStrategy::Full(s) => s.finish(ctx)?,
            SortStrategy::Incremental(s) => s.finish(),
            SortStrategy::TopK(s) => s.finish(ctx)?,
        }
        ctx.check_cancelled()?;
        *self.state_mut() = StrategyState::Finalized;
        Ok(())
    }

    fn rows(&self) -> &RowContainer {
        match self {
            SortStrategy::Full(s) => &s.rows,
            SortStrategy::Incremental(s) => &s.rows,
            SortStrategy::TopK(s) => &s.rows,
        }
    }

    fn state_ref(&self) -> &StrategyState {
        match self {
            SortStrategy::Full(s) => &s.state,
            SortStrategy::Incremental(s) => &s.state,
            SortStrategy::TopK(s) => &s.state,
        }
    }

    fn state_mut(&mut self) -> &mut StrategyState {
        match self {
            SortStrategy::Full(s) => &mut s.state,
            SortStrategy::Incremental(s) => &mut s.state,
            SortStrategy::TopK(s) => &mut s.state,
        }
    }
}

impl ValueIterator for SortStrategy {
    fn next(&mut self, ctx: &ExecContext) -> ExecutorResult<bool> {
        match self.state() {
            StrategyState::Finalized | StrategyState::Draining => {}
            StrategyState::Ingesting => {
                return Err(ExecutorError::sort_protocol("next called before finish"))
            }
            StrategyState::Closed => return Ok(false),
        }
        ctx.check_cancelled()?;
        *self.state_mut() = StrategyState::Draining;
        let more = match self {
            SortStrategy::Full(s) => s.next(),
            SortStrategy::Incremental(s) => s.next(),
            SortStrategy::TopK(s) => s.next(),
        };
        Ok(more)
    }

    fn values(&self) -> &[Datum] {
        if self.state() != StrategyState::Draining {
            return &[];
        }
        match self {
            SortStrategy::Full(s) if s.cursor > 0 => s.values(),
            SortStrategy::Incremental(s) => s.values(),
            SortStrategy::TopK(s) if s.cursor > 0 => s.values(),
            _ => &[],
        }
    }

    fn close(&mut self, _ctx: &ExecContext) -> ExecutorResult<()> {
        match self {
            SortStrategy::Full(s) => s.rows.clear(),
            SortStrategy::Incremental(s) => s.rows.clear(),
            SortStrategy::TopK(s) => s.rows.clear(),
        }
        *self.state_mut() = StrategyState::Closed;
        Ok(())
    }
}
