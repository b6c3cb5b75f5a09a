//! Executor error types
//!
//! Error codes:
//! - AERO_EXECUTION_FAILED (ERROR)
//! - AERO_EXECUTION_LIMIT (ERROR)
//! - AERO_EXECUTION_CANCELLED (ERROR)
//! - AERO_SORT_PROTOCOL (ERROR)
//!
//! All executor errors are terminal for the current query.

use std::fmt;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but system is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// General execution failure (upstream pull, evaluation, bad row shape)
    AeroExecutionFailed,
    /// Sort memory budget exceeded while copying a row
    AeroExecutionLimit,
    /// Cancellation was signaled mid-execution
    AeroExecutionCancelled,
    /// A sorting strategy was driven out of order
    AeroSortProtocol,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::AeroExecutionFailed => "AERO_EXECUTION_FAILED",
            ExecutorErrorCode::AeroExecutionLimit => "AERO_EXECUTION_LIMIT",
            ExecutorErrorCode::AeroExecutionCancelled => "AERO_EXECUTION_CANCELLED",
            ExecutorErrorCode::AeroSortProtocol => "AERO_SORT_PROTOCOL",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    /// Error code
    code: ExecutorErrorCode,
    /// Human-readable message
    message: String,
}

impl ExecutorError {
    /// Create an execution failed error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroExecutionFailed,
            message: reason.into(),
        }
    }

    /// Create an execution limit error
    pub fn execution_limit(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroExecutionLimit,
            message: reason.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled() -> Self {
        Self {
            code: ExecutorErrorCode::AeroExecutionCancelled,
            message: "query execution was cancelled".into(),
        }
    }

    /// Create a sort protocol violation error
    pub fn sort_protocol(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroSortProtocol,
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
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

    /// Returns whether this error came from cancellation
    pub fn is_cancelled(&self) -> bool {
        self.code == ExecutorErrorCode::AeroExecutionCancelled
    }
}

impl fmt::Display for ExecutorError {
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

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
