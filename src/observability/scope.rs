//! ObservationScope for begin/complete logging around one operation
//!
//! - Logs BEGIN event on creation
//! - Logs COMPLETE, ERROR or CANCELLED when closed explicitly
//! - Logs INCOMPLETE on drop if never closed

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs the lifecycle of one operation
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::with_fields("SORT", &[("strategy", "full")]);
/// // ... do work ...
/// scope.complete_with_fields(&[("rows", "42")]); // logs SORT_COMPLETE
/// ```
///
/// Every closing event carries the fields given at creation plus
/// `elapsed_ms`.
#[derive(Debug)]
pub struct ObservationScope {
    name: &'static str,
    completed: bool,
    fields: Vec<(&'static str, String)>,
    timer: Timer,
}

impl ObservationScope {
    /// Create a new observation scope
    ///
    /// Logs `{name}_BEGIN` immediately.
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope with fields repeated on every event
    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);

        Self {
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
        }
    }

    /// Mark the scope as successfully completed
    ///
    /// Logs `{name}_COMPLETE` at INFO level.
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();
        let mut all_fields = self.field_refs();
        all_fields.push(("elapsed_ms", &elapsed));
        all_fields.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Mark the scope as failed
    ///
    /// Logs `{name}_ERROR` at ERROR level.
    pub fn fail(mut self, code: &str, reason: &str) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();
        let mut all_fields = self.field_refs();
        all_fields.push(("elapsed_ms", &elapsed));
        all_fields.push(("code", code));
        all_fields.push(("reason", reason));
        Logger::error(&format!("{}_ERROR", self.name), &all_fields);
    }

    /// Mark the scope as abandoned through cancellation
    ///
    /// Logs `{name}_CANCELLED` at WARN level.
    pub fn cancel(mut self) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();
        let mut all_fields = self.field_refs();
        all_fields.push(("elapsed_ms", &elapsed));
        Logger::warn(&format!("{}_CANCELLED", self.name), &all_fields);
    }

    /// Check if the scope has been closed
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            let event = format!("{}_INCOMPLETE", self.name);
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}

/// A simple duration timer for logging elapsed time
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_starts_open() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
        scope.complete();
    }

    #[test]
    fn test_scope_with_fields_and_extra_fields() {
        let scope = ObservationScope::with_fields("SORT", &[("strategy", "full")]);
        scope.complete_with_fields(&[("rows", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("SORT");
        scope.fail("AERO_EXECUTION_LIMIT", "sort memory budget exceeded");
    }

    #[test]
    fn test_scope_cancel() {
        let scope = ObservationScope::new("SORT");
        scope.cancel();
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let ms: u64 = timer.elapsed_ms().parse().unwrap();
        assert!(ms >= 10);
    }
}
