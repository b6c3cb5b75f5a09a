//! Planner error types
//!
//! Error codes (all REJECT, detected before any row is pulled):
//! - AERO_ORDER_BY_UNKNOWN_COLUMN
//! - AERO_ORDER_BY_POSITION_OUT_OF_RANGE
//! - AERO_ORDER_BY_NON_INTEGER
//! - AERO_ORDER_BY_AMBIGUOUS
//! - AERO_ORDER_BY_UNKNOWN_TABLE
//! - AERO_ORDER_BY_UNKNOWN_INDEX
//! - AERO_ORDER_BY_UNORDERABLE_TYPE
//! - AERO_ORDER_BY_UNSUPPORTED
//! - AERO_QUERY_INVALID

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Ordering expression names no column and cannot be rendered
    AeroOrderByUnknownColumn,
    /// Ordinal outside `[1, N]`
    AeroOrderByPositionOutOfRange,
    /// Constant that cannot be an ordinal
    AeroOrderByNonInteger,
    /// Alias matches several non-equivalent columns
    AeroOrderByAmbiguous,
    /// Table named by an index ordering is not in the catalog
    AeroOrderByUnknownTable,
    /// Index named by an index ordering does not exist
    AeroOrderByUnknownIndex,
    /// Column type has no total order
    AeroOrderByUnorderableType,
    /// Ordering clause kind not handled
    AeroOrderByUnsupported,
    /// Malformed expression
    AeroQueryInvalid,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::AeroOrderByUnknownColumn => "AERO_ORDER_BY_UNKNOWN_COLUMN",
            PlannerErrorCode::AeroOrderByPositionOutOfRange => {
                "AERO_ORDER_BY_POSITION_OUT_OF_RANGE"
            }
            PlannerErrorCode::AeroOrderByNonInteger => "AERO_ORDER_BY_NON_INTEGER",
            PlannerErrorCode::AeroOrderByAmbiguous => "AERO_ORDER_BY_AMBIGUOUS",
            PlannerErrorCode::AeroOrderByUnknownTable => "AERO_ORDER_BY_UNKNOWN_TABLE",
            PlannerErrorCode::AeroOrderByUnknownIndex => "AERO_ORDER_BY_UNKNOWN_INDEX",
            PlannerErrorCode::AeroOrderByUnorderableType => "AERO_ORDER_BY_UNORDERABLE_TYPE",
            PlannerErrorCode::AeroOrderByUnsupported => "AERO_ORDER_BY_UNSUPPORTED",
            PlannerErrorCode::AeroQueryInvalid => "AERO_QUERY_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Offending identifier or expression if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create an unknown column error
    pub fn unknown_column(expr: impl Into<String>) -> Self {
        let e = expr.into();
        Self {
            code: PlannerErrorCode::AeroOrderByUnknownColumn,
            message: format!("column {} does not exist", e),
            field: Some(e),
        }
    }

    /// Create an ordinal out of range error
    pub fn position_out_of_range(expr: impl Into<String>) -> Self {
        let e = expr.into();
        Self {
            code: PlannerErrorCode::AeroOrderByPositionOutOfRange,
            message: format!("ORDER BY position {} is not in select list", e),
            field: Some(e),
        }
    }

    /// Create a non-integer constant error
    pub fn non_integer(expr: impl Into<String>) -> Self {
        let e = expr.into();
        Self {
            code: PlannerErrorCode::AeroOrderByNonInteger,
            message: format!("non-integer constant in ORDER BY: {}", e),
            field: Some(e),
        }
    }

    /// Create an ambiguous alias error
    pub fn ambiguous(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            code: PlannerErrorCode::AeroOrderByAmbiguous,
            message: format!("ORDER BY \"{}\" is ambiguous", n),
            field: Some(n),
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        let t = table.into();
        Self {
            code: PlannerErrorCode::AeroOrderByUnknownTable,
            message: format!("table \"{}\" does not exist", t),
            field: Some(t),
        }
    }

    /// Create an unknown index error
    pub fn unknown_index(table: &str, index: &str) -> Self {
        Self {
            code: PlannerErrorCode::AeroOrderByUnknownIndex,
            message: format!("index \"{}@{}\" not found", table, index),
            field: Some(index.to_string()),
        }
    }

    /// Create an unorderable type error
    pub fn unorderable_type(column: impl Into<String>, typ: impl fmt::Display) -> Self {
        Self {
            code: PlannerErrorCode::AeroOrderByUnorderableType,
            message: format!("can't order by column type {}", typ),
            field: Some(column.into()),
        }
    }

    /// Create an unsupported ordering error
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroOrderByUnsupported,
            message: reason.into(),
            field: None,
        }
    }

    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending identifier if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
