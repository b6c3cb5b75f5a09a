//! Execution context
//!
//! Carried explicitly into every long-running step (ingestion loop, full
//! sort, heap drain). Holds the cancellation token plus the planner's
//! hints about how much of the sorted output will be consumed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::errors::{ExecutorError, ExecutorResult};

/// Shared cancellation flag.
///
/// Cloning yields a handle to the same flag, so a client-side timeout
/// can cancel a query from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Context for one query execution
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Query ID for log correlation
    pub query_id: Uuid,
    cancel: CancellationToken,
    /// Provable row limit downstream of the sort, if any
    row_limit: Option<u64>,
    /// True if only an unknown prefix of the sorted output is expected
    partial_consumption: bool,
    started_at: Instant,
}

impl ExecContext {
    /// Create a new context with a fresh cancellation token
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Create a context observing an existing token
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            cancel,
            row_limit: None,
            partial_consumption: false,
            started_at: Instant::now(),
        }
    }

    /// Sets the downstream row limit
    pub fn with_row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Hints that the consumer will likely stop early
    pub fn with_partial_consumption(mut self) -> Self {
        self.partial_consumption = true;
        self
    }

    pub fn row_limit(&self) -> Option<u64> {
        self.row_limit
    }

    pub fn partial_consumption(&self) -> bool {
        self.partial_consumption
    }

    /// Returns a handle to this context's cancellation token
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fails with AERO_EXECUTION_CANCELLED once cancellation is signaled
    pub fn check_cancelled(&self) -> ExecutorResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ExecutorError::cancelled());
        }
        Ok(())
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}
