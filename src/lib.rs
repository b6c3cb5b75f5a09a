//! aerosort - ORDER BY resolution and sort execution
//!
//! The planner turns an ORDER BY clause into a column ordering over a plan
//! node's output, adding hidden columns when needed. The executor sorts the
//! node's rows with a full sort, an incremental heap sort or a bounded
//! top-k, depending on what the consumer is known to read.

pub mod cli;
pub mod config;
pub mod container;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod schema;
