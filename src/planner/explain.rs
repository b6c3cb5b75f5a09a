//! Explain output for a resolved ORDER BY
//!
//! Produces deterministic output, either as text or as JSON.

use std::fmt;

use serde::Serialize;

use crate::schema::ResultColumns;

use super::errors::PlannerError;
use super::order_by::SortPlan;

/// One resolved ordering column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainColumn {
    /// Output column name
    pub column: String,
    /// Output column index
    pub index: usize,
    /// "asc" or "desc"
    pub direction: String,
}

/// Explain output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether resolution succeeded
    pub accepted: bool,
    /// True if the clause resolved to no ordering and the sort is dropped
    pub sort_elided: bool,
    /// Resolved ordering
    pub ordering: Vec<ExplainColumn>,
    /// Strategy the executor would choose, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Columns added only to support the ordering
    pub hidden_columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful resolution.
    ///
    /// `columns` are the sorted node's columns after resolution, hidden
    /// ones included.
    pub fn from_plan(plan: &SortPlan, columns: &ResultColumns, strategy: Option<&str>) -> Self {
        let ordering = plan
            .ordering
            .iter()
            .map(|o| ExplainColumn {
                column: columns
                    .get(o.col_idx)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                index: o.col_idx,
                direction: o.direction.as_str().to_string(),
            })
            .collect();

        Self {
            accepted: true,
            sort_elided: false,
            ordering,
            strategy: strategy.map(str::to_string),
            hidden_columns: columns.iter().filter(|c| c.hidden).count(),
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan for a clause that needs no sort
    pub fn elided() -> Self {
        Self {
            accepted: true,
            sort_elided: true,
            ordering: Vec::new(),
            strategy: None,
            hidden_columns: 0,
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan from a resolution error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            sort_elided: false,
            ordering: Vec::new(),
            strategy: None,
            hidden_columns: 0,
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN ORDER BY ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if self.sort_elided {
            writeln!(f, "Sort: none")?;
            return Ok(());
        }
        writeln!(f, "Ordering:")?;
        for col in &self.ordering {
            writeln!(f, "  - {} (#{}) {}", col.column, col.index, col.direction)?;
        }
        if let Some(strategy) = &self.strategy {
            writeln!(f, "Strategy: {}", strategy)?;
        }
        if self.hidden_columns > 0 {
            writeln!(f, "Hidden Columns: {}", self.hidden_columns)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnOrderInfo, DatumType, ResultColumn};

    fn plan() -> (SortPlan, ResultColumns) {
        let columns = vec![
            ResultColumn::new("a", DatumType::Int),
            ResultColumn::hidden("b", DatumType::String),
        ];
        let plan = SortPlan {
            columns: columns[..1].to_vec(),
            ordering: vec![ColumnOrderInfo::desc(1), ColumnOrderInfo::asc(0)],
        };
        (plan, columns)
    }

    #[test]
    fn test_explain_accepted_plan() {
        let (plan, columns) = plan();
        let explain = ExplainPlan::from_plan(&plan, &columns, Some("top_k"));

        assert!(explain.accepted);
        assert_eq!(explain.hidden_columns, 1);
        assert_eq!(explain.ordering[0].column, "b");
        assert_eq!(explain.ordering[0].direction, "desc");

        let output = format!("{}", explain);
        assert!(output.contains("ACCEPTED"));
        assert!(output.contains("Strategy: top_k"));
    }

    #[test]
    fn test_explain_json_shape() {
        let (plan, columns) = plan();
        let value = serde_json::to_value(ExplainPlan::from_plan(&plan, &columns, None)).unwrap();
        assert_eq!(value["ordering"][1]["index"], 0);
        assert_eq!(value["ordering"][1]["direction"], "asc");
        assert!(value.get("strategy").is_none());
    }

    #[test]
    fn test_explain_rejected_plan() {
        let err = PlannerError::ambiguous("b");
        let explain = ExplainPlan::from_error(&err);

        assert!(!explain.accepted);
        assert_eq!(explain.rejection_code, Some("AERO_ORDER_BY_AMBIGUOUS".into()));
        assert!(format!("{}", explain).contains("REJECTED"));
    }

    #[test]
    fn test_explain_deterministic() {
        let (plan, columns) = plan();
        let first = format!("{}", ExplainPlan::from_plan(&plan, &columns, Some("full")));
        let second = format!("{}", ExplainPlan::from_plan(&plan, &columns, Some("full")));
        assert_eq!(first, second);
    }
}
