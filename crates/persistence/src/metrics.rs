//! Store metrics collection.
//!
//! Provides functions for recording key-value store metrics.

use metrics::histogram;
use std::time::Instant;

/// Record store operation duration.
pub fn record_operation_duration(operation: &str, duration_secs: f64) {
    histogram!(
        "store_operation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// A helper to time store operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("save_template");
/// let result = self.store.put_item(&self.table_name, item).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    operation: String,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_operation_duration(&self.operation, duration);
    }
}
