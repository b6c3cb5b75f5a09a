//! Sort operator
//!
//! Wraps an input operator and re-exposes its rows in the resolved order.
//! Sorting is lazy: nothing is pulled from the input until the first `next`.

use std::sync::Arc;

use crate::config::SortConfig;
use crate::container::RowContainer;
use crate::observability::{MetricsRegistry, ObservationScope};
use crate::planner::SortPlan;
use crate::schema::{ColumnOrdering, Datum, ResultColumns};

use super::context::ExecContext;
use super::errors::{ExecutorError, ExecutorResult};
use super::plan_node::{PlanNode, ValueIterator};
use super::sorter::{SortStrategy, StrategyKind, StrategyState};

/// Lifecycle of a sort operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    NotStarted,
    Sorting,
    Draining,
    Closed,
}

/// Operator that sorts the rows of its input
pub struct SortNode {
    source: Box<dyn PlanNode>,
    /// Columns requested by the query; rows are truncated to this width
    columns: ResultColumns,
    ordering: ColumnOrdering,
    config: SortConfig,
    metrics: Option<Arc<MetricsRegistry>>,
    state: SortState,
    /// Set once rows are pulled into a strategy; `None` when the input was
    /// sorted in place or no sort is needed
    strategy: Option<SortStrategy>,
}

impl SortNode {
    /// Wraps `source`, which must be the node the plan was resolved against
    pub fn new(source: Box<dyn PlanNode>, plan: SortPlan, config: SortConfig) -> Self {
        Self {
            source,
            columns: plan.columns,
            ordering: plan.ordering,
            config,
            metrics: None,
            state: SortState::NotStarted,
            strategy: None,
        }
    }

    /// Reports counters to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    pub fn ordering(&self) -> &ColumnOrdering {
        &self.ordering
    }

    /// Strategy chosen for the sort, once sorting has begun
    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        self.strategy.as_ref().map(SortStrategy::kind)
    }

    /// Lifecycle state of the strategy, once sorting has begun
    pub fn strategy_state(&self) -> Option<StrategyState> {
        self.strategy.as_ref().map(SortStrategy::state)
    }

    fn sort(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        if self.ordering.is_empty() {
            return Ok(());
        }

        let query_id = ctx.query_id.to_string();

        if let Some(values) = self.source.as_values_mut() {
            ctx.check_cancelled()?;
            let scope = ObservationScope::with_fields(
                "SORT",
                &[("query_id", &query_id), ("strategy", "in_place")],
            );
            values.sort(&self.ordering);
            let rows = values.len().to_string();
            scope.complete_with_fields(&[("rows", &rows)]);
            if let Some(m) = &self.metrics {
                m.increment_sorts_completed();
            }
            return Ok(());
        }

        let kind = StrategyKind::select(ctx, &self.config);
        let container = RowContainer::new(self.source.columns(), self.ordering.clone())
            .with_memory_budget(self.config.memory_budget());
        let mut strategy = SortStrategy::new(kind, container);

        let scope = ObservationScope::with_fields(
            "SORT",
            &[("query_id", &query_id), ("strategy", kind.as_str())],
        );

        match self.ingest(ctx, &mut strategy) {
            Ok(ingested) => {
                let discarded = strategy.discarded();
                scope.complete_with_fields(&[
                    ("rows_ingested", &ingested.to_string()),
                    ("rows_discarded", &discarded.to_string()),
                ]);
                if let Some(m) = &self.metrics {
                    m.add_rows_ingested(ingested);
                    m.add_rows_discarded(discarded);
                    m.increment_sorts_completed();
                }
                self.strategy = Some(strategy);
                Ok(())
            }
            Err(err) => {
                // The partially filled strategy is dropped here.
                if err.is_cancelled() {
                    scope.cancel();
                    if let Some(m) = &self.metrics {
                        m.increment_sorts_cancelled();
                    }
                } else {
                    scope.fail(err.code().code(), err.message());
                    if let Some(m) = &self.metrics {
                        m.increment_sorts_failed();
                    }
                }
                Err(err)
            }
        }
    }

    /// Pulls every input row into `strategy`, then finalizes it.
    fn ingest(&mut self, ctx: &ExecContext, strategy: &mut SortStrategy) -> ExecutorResult<u64> {
        let mut ingested = 0u64;
        loop {
            ctx.check_cancelled()?;
            if !self.source.next(ctx)? {
                break;
            }
            strategy.add(ctx, self.source.values())?;
            ingested += 1;
        }
        strategy.finish(ctx)?;
        Ok(ingested)
    }
}

impl ValueIterator for SortNode {
    fn next(&mut self, ctx: &ExecContext) -> ExecutorResult<bool> {
        match self.state {
            SortState::Closed => return Ok(false),
            SortState::Sorting => {
                return Err(ExecutorError::sort_protocol(
                    "sort failed earlier and produces no rows",
                ))
            }
            SortState::NotStarted => {
                self.state = SortState::Sorting;
                self.sort(ctx)?;
                self.state = SortState::Draining;
            }
            SortState::Draining => {}
        }

        match self.strategy.as_mut() {
            Some(strategy) => strategy.next(ctx),
            None => {
                ctx.check_cancelled()?;
                self.source.next(ctx)
            }
        }
    }

    fn values(&self) -> &[Datum] {
        let row = match &self.strategy {
            Some(strategy) => strategy.values(),
            None => self.source.values(),
        };
        &row[..row.len().min(self.columns.len())]
    }

    fn close(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        let source_result = self.source.close(ctx);
        let strategy_result = match self.strategy.as_mut() {
            Some(strategy) => strategy.close(ctx),
            None => Ok(()),
        };
        self.state = SortState::Closed;
        source_result.and(strategy_result)
    }
}

impl PlanNode for SortNode {
    fn start(&mut self, ctx: &ExecContext) -> ExecutorResult<()> {
        self.source.start(ctx)
    }

    fn columns(&self) -> &ResultColumns {
        &self.columns
    }

    fn name(&self) -> &'static str {
        "sort"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ValuesNode;
    use crate::schema::{ColumnOrderInfo, DatumType, ResultColumn};

    fn values() -> ValuesNode {
        ValuesNode::from_rows(
            vec![
                ResultColumn::new("n", DatumType::Int),
                ResultColumn::new("s", DatumType::String),
            ],
            vec![
                vec![Datum::Int(3), Datum::String("c".into())],
                vec![Datum::Int(1), Datum::String("a".into())],
                vec![Datum::Int(2), Datum::String("b".into())],
            ],
        )
        .unwrap()
    }

    fn plan(ordering: ColumnOrdering) -> SortPlan {
        SortPlan {
            columns: values().columns().clone(),
            ordering,
        }
    }

    fn keys(node: &mut SortNode, ctx: &ExecContext) -> Vec<Datum> {
        node.start(ctx).unwrap();
        let mut out = Vec::new();
        while node.next(ctx).unwrap() {
            out.push(node.values()[0].clone());
        }
        out
    }

    #[test]
    fn test_values_input_sorted_in_place() {
        let ctx = ExecContext::new();
        let mut node = SortNode::new(
            Box::new(values()),
            plan(vec![ColumnOrderInfo::desc(0)]),
            SortConfig::default(),
        );
        assert_eq!(keys(&mut node, &ctx), vec![Datum::Int(3), Datum::Int(2), Datum::Int(1)]);
        assert_eq!(node.strategy_kind(), None);
        assert_eq!(node.state(), SortState::Draining);
        node.close(&ctx).unwrap();
        assert_eq!(node.state(), SortState::Closed);
        assert!(!node.next(&ctx).unwrap());
    }

    #[test]
    fn test_empty_ordering_passes_through() {
        let ctx = ExecContext::new();
        let mut node = SortNode::new(Box::new(values()), plan(vec![]), SortConfig::default());
        assert_eq!(keys(&mut node, &ctx), vec![Datum::Int(3), Datum::Int(1), Datum::Int(2)]);
    }
}
