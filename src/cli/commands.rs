//! CLI command implementations
//!
//! Both commands read one input document:
//!
//! ```json
//! {
//!   "table": "t",
//!   "columns": [{"name": "a", "type": "int"}, {"name": "b", "type": "string"}],
//!   "rows": [[3, "x"], [1, "y"]],
//!   "renders": [{"alias": "c", "expr": {"column": {"name": "a"}}}],
//!   "order_by": [{"expr": {"column": {"name": "a"}}, "direction": "desc"}],
//!   "catalog": {"tables": []}
//! }
//! ```
//!
//! Without `renders` the rows are sorted as a VALUES list, unless `table`
//! is given, in which case they are projected as `SELECT *` from it.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SortConfig;
use crate::executor::{
    ExecContext, PlanNode, RenderNode, SortNode, StrategyKind, ValueIterator, ValuesNode,
};
use crate::observability::{Logger, MetricsRegistry};
use crate::planner::{Expr, ExplainPlan, MemoryCatalog, OrderBy, OrderByResolver, PlannerError};
use crate::schema::{Datum, ResultColumn, ResultColumns, Row};

use super::args::{Cli, Command, SortArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_error, write_response};

/// One projected output column of the input document
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSpec {
    #[serde(default)]
    pub alias: Option<String>,
    pub expr: Expr,
}

/// Input document shared by `sort` and `explain`
#[derive(Debug, Clone, Deserialize)]
pub struct SortDocument {
    /// Name the input rows are addressed by in qualified references
    #[serde(default)]
    pub table: Option<String>,
    pub columns: ResultColumns,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub renders: Option<Vec<RenderSpec>>,
    /// Decoded separately so that unknown clause kinds map to a planner code
    #[serde(default)]
    pub order_by: Value,
    #[serde(default)]
    pub catalog: MemoryCatalog,
}

/// Per-invocation options
#[derive(Debug, Clone, Copy, Default)]
pub struct SortOptions {
    pub limit: Option<u64>,
    pub partial: bool,
    pub metrics: bool,
}

impl SortOptions {
    fn from_args(args: &SortArgs, metrics: bool) -> Self {
        Self {
            limit: args.limit,
            partial: args.partial,
            metrics,
        }
    }

    fn context(&self) -> ExecContext {
        let mut ctx = ExecContext::new();
        if let Some(limit) = self.limit {
            ctx = ctx.with_row_limit(limit);
        }
        if self.partial {
            ctx = ctx.with_partial_consumption();
        }
        ctx
    }
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command, reporting failures as an error response
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Sort { args, metrics } => sort(&args, metrics),
        Command::Explain { args } => explain(&args),
    };

    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// `aerosort sort`
pub fn sort(args: &SortArgs, metrics: bool) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let doc = read_document(args.input.as_deref())?;
    let registry = Arc::new(MetricsRegistry::new());
    let data = sort_document(
        doc,
        &config,
        SortOptions::from_args(args, metrics),
        registry,
    )?;
    write_response(data)
}

/// `aerosort explain`
pub fn explain(args: &SortArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let doc = read_document(args.input.as_deref())?;
    let data = explain_document(doc, &config, SortOptions::from_args(args, false))?;
    write_response(data)
}

/// Loads the configuration file, or the defaults, and applies its log level
pub fn load_config(path: Option<&Path>) -> CliResult<SortConfig> {
    let config = match path {
        Some(p) => SortConfig::load(p)?,
        None => SortConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

/// Resolves the document's ORDER BY and returns its rows in order.
///
/// Output rows carry only the requested columns and at most `limit` of
/// them.
pub fn sort_document(
    doc: Value,
    config: &SortConfig,
    options: SortOptions,
    metrics: Arc<MetricsRegistry>,
) -> CliResult<Value> {
    let doc: SortDocument = serde_json::from_value(doc)?;
    let clause = decode_order_by(&doc.order_by)?;
    let mut node = build_input(&doc)?;
    let requested = node.columns().clone();

    let plan = OrderByResolver::new(&doc.catalog)
        .with_metrics(&metrics)
        .order_by(&clause, node.as_mut())?;

    let mut root: Box<dyn PlanNode> = match plan {
        Some(plan) => Box::new(
            SortNode::new(node, plan, config.clone()).with_metrics(Arc::clone(&metrics)),
        ),
        None => node,
    };

    let ctx = options.context();
    let drained = drain(root.as_mut(), &ctx, options.limit);
    let closed = root.close(&ctx);
    let rows = drained?;
    closed?;

    let columns: Vec<&ResultColumn> = requested.iter().filter(|c| !c.hidden).collect();

    let mut data = json!({
        "columns": columns,
        "rows": rows,
    });
    if options.metrics {
        data["metrics"] = serde_json::to_value(metrics.snapshot())?;
    }
    Ok(data)
}

/// Resolves the document's ORDER BY without pulling any rows.
///
/// Resolution errors are reported inside the plan rather than returned.
pub fn explain_document(doc: Value, config: &SortConfig, options: SortOptions) -> CliResult<Value> {
    let doc: SortDocument = serde_json::from_value(doc)?;
    let mut node = build_input(&doc)?;

    let resolved = decode_order_by(&doc.order_by).and_then(|clause| {
        OrderByResolver::new(&doc.catalog).order_by(&clause, node.as_mut())
    });

    let plan = match resolved {
        Ok(Some(plan)) => {
            let strategy = if node.as_values_mut().is_some() {
                "in_place"
            } else {
                StrategyKind::select(&options.context(), config).as_str()
            };
            ExplainPlan::from_plan(&plan, node.columns(), Some(strategy))
        }
        Ok(None) => ExplainPlan::elided(),
        Err(e) => ExplainPlan::from_error(&e),
    };

    Ok(json!({
        "plan": serde_json::to_value(&plan)?,
        "text": plan.to_string(),
    }))
}

fn decode_order_by(value: &Value) -> Result<OrderBy, PlannerError> {
    if value.is_null() {
        return Ok(OrderBy::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| PlannerError::unsupported(format!("unknown ORDER BY specification: {}", e)))
}

fn build_input(doc: &SortDocument) -> CliResult<Box<dyn PlanNode>> {
    let rows = decode_rows(&doc.columns, &doc.rows)?;
    let values: Box<dyn PlanNode> = Box::new(ValuesNode::from_rows(doc.columns.clone(), rows)?);
    let table = doc.table.as_deref();

    match (&doc.renders, table) {
        (Some(renders), _) => {
            let targets = renders
                .iter()
                .map(|r| (r.alias.clone(), r.expr.clone()))
                .collect();
            Ok(Box::new(RenderNode::new(values, table, targets)?))
        }
        (None, Some(_)) => Ok(Box::new(RenderNode::star(values, table)?)),
        (None, None) => Ok(values),
    }
}

fn decode_rows(columns: &ResultColumns, rows: &[Vec<Value>]) -> CliResult<Vec<Row>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != columns.len() {
                return Err(CliError::invalid_input(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            row.iter()
                .zip(columns)
                .map(|(v, c)| Datum::from_json(v, &c.typ))
                .collect::<Result<Row, _>>()
                .map_err(|reason| CliError::invalid_input(format!("row {}: {}", i, reason)))
        })
        .collect()
}

fn drain(node: &mut dyn PlanNode, ctx: &ExecContext, limit: Option<u64>) -> CliResult<Vec<Value>> {
    node.start(ctx)?;
    let mut out = Vec::new();
    while limit.map_or(true, |l| (out.len() as u64) < l) && node.next(ctx)? {
        out.push(Value::Array(node.values().iter().map(Datum::to_json).collect()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(order_by: Value) -> Value {
        json!({
            "columns": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "string"}
            ],
            "rows": [[3, "x"], [1, "y"], [2, "z"], [1, "w"]],
            "order_by": order_by
        })
    }

    fn sorted(doc: Value, options: SortOptions) -> CliResult<Value> {
        sort_document(
            doc,
            &SortConfig::default(),
            options,
            Arc::new(MetricsRegistry::new()),
        )
    }

    #[test]
    fn test_sort_values_by_position() {
        let out = sorted(
            doc(json!([
                {"expr": {"num_val": "1"}},
                {"expr": {"num_val": "2"}, "direction": "desc"}
            ])),
            SortOptions::default(),
        )
        .unwrap();

        assert_eq!(
            out["rows"],
            json!([[1, "y"], [1, "w"], [2, "z"], [3, "x"]])
        );
        assert_eq!(out["columns"][0], json!({"name": "a", "type": "int"}));
    }

    #[test]
    fn test_sort_without_order_by_keeps_input_order() {
        let out = sorted(doc(Value::Null), SortOptions::default()).unwrap();
        assert_eq!(out["rows"][0], json!([3, "x"]));
        assert_eq!(out["rows"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_hidden_render_not_returned() {
        let mut input = doc(json!([{"expr": {"column": {"name": "a"}}, "direction": "desc"}]));
        input["table"] = json!("t");
        input["renders"] = json!([{"expr": {"column": {"name": "b"}}}]);

        let options = SortOptions {
            limit: Some(2),
            ..SortOptions::default()
        };
        let out = sorted(input, options).unwrap();

        assert_eq!(out["columns"].as_array().unwrap().len(), 1);
        assert_eq!(out["rows"], json!([["x"], ["z"]]));
    }

    #[test]
    fn test_index_order_through_catalog() {
        let mut input = doc(json!([{"index": {"table": "t", "index": "by_b"}, "direction": "desc"}]));
        input["table"] = json!("t");
        input["catalog"] = json!({
            "tables": [{
                "name": "t",
                "primary_index": {"name": "primary", "column_names": ["a"]},
                "indexes": [{"name": "by_b", "column_names": ["b"]}]
            }]
        });

        let out = sorted(input, SortOptions::default()).unwrap();
        assert_eq!(out["rows"][0], json!([2, "z"]));
        assert_eq!(out["rows"][3], json!([1, "w"]));
    }

    #[test]
    fn test_resolution_error_code_preserved() {
        let err = sorted(doc(json!([{"expr": {"num_val": "4"}}])), SortOptions::default())
            .unwrap_err();
        assert_eq!(err.code_str(), "AERO_ORDER_BY_POSITION_OUT_OF_RANGE");
        assert_eq!(err.message(), "ORDER BY position 4 is not in select list");
    }

    #[test]
    fn test_unknown_clause_kind_is_unsupported() {
        let err = sorted(
            doc(json!([{"collation": {"name": "x"}}])),
            SortOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "AERO_ORDER_BY_UNSUPPORTED");
    }

    #[test]
    fn test_row_arity_mismatch_rejected() {
        let mut input = doc(Value::Null);
        input["rows"] = json!([[1]]);
        let err = sorted(input, SortOptions::default()).unwrap_err();
        assert_eq!(err.code_str(), "AERO_CLI_INVALID_INPUT");
    }

    #[test]
    fn test_metrics_included_on_request() {
        let options = SortOptions {
            metrics: true,
            ..SortOptions::default()
        };
        let out = sorted(doc(json!([{"expr": {"num_val": "1"}}])), options).unwrap();
        assert_eq!(out["metrics"]["orderings_resolved"], 1);
        assert_eq!(out["metrics"]["sorts_completed"], 1);
    }

    #[test]
    fn test_explain_reports_strategy() {
        let mut input = doc(json!([{"expr": {"column": {"name": "a"}}}]));
        input["table"] = json!("t");
        let options = SortOptions {
            limit: Some(3),
            ..SortOptions::default()
        };

        let out = explain_document(input, &SortConfig::default(), options).unwrap();
        assert_eq!(out["plan"]["accepted"], true);
        assert_eq!(out["plan"]["strategy"], "top_k");
        assert!(out["text"].as_str().unwrap().contains("EXPLAIN ORDER BY"));
    }

    #[test]
    fn test_explain_reports_rejection() {
        let out = explain_document(
            doc(json!([{"expr": {"str": "x"}}])),
            &SortConfig::default(),
            SortOptions::default(),
        )
        .unwrap();
        assert_eq!(out["plan"]["accepted"], false);
        assert_eq!(out["plan"]["rejection_code"], "AERO_ORDER_BY_NON_INTEGER");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aerosort.json");
        fs::write(&path, r#"{"max_top_k": 5, "log_level": "error"}"#).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.max_top_k, 5);

        fs::write(&path, r#"{"max_top_k": 0}"#).unwrap();
        let err = load_config(Some(path.as_path())).unwrap_err();
        assert_eq!(err.code_str(), "AERO_CLI_CONFIG_ERROR");

        Logger::set_min_severity(crate::observability::Severity::Warn);
    }
}
