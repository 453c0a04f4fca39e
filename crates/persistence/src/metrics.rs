//! Repository query latency.

use metrics::{counter, histogram};
use std::time::Instant;

fn record_query(query_name: &'static str, outcome: &'static str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name,
        "outcome" => outcome
    )
    .record(duration_secs);
    if outcome == "error" {
        counter!("database_query_errors_total", "query" => query_name).increment(1);
    }
}

/// Times one repository call.
///
/// A timer dropped without `record` or `finish` (an early `?` return inside a
/// transaction) is counted as an error.
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
    done: bool,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
            done: false,
        }
    }

    pub fn record(self) {
        self.complete("ok");
    }

    /// Records the call with an outcome taken from its result.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        self.complete(if result.is_ok() { "ok" } else { "error" });
    }

    fn complete(mut self, outcome: &'static str) {
        self.done = true;
        record_query(self.query_name, outcome, self.start.elapsed().as_secs_f64());
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        if !self.done {
            record_query(self.query_name, "error", self.start.elapsed().as_secs_f64());
        }
    }
}
