//! Observability for ORDER BY resolution and sort execution
//!
//! - Structured logging (JSON lines on stderr)
//! - Counter metrics
//! - Begin/complete scopes around sorts
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use aerosort::observability::{Logger, MetricsRegistry, ObservationScope};
//!
//! Logger::info("ORDER_BY_RESOLVED", &[("columns", "2")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_sorts_completed();
//!
//! let scope = ObservationScope::new("SORT");
//! scope.complete();
//! ```

mod logger;
mod metrics;
mod scope;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};
