// Wrapper Components
// High-level wrappers that layer tracing and metrics onto any index
// engine without changing its semantics.

use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::contracts::Index;
use crate::observability::{count_operation, count_query, record_metric, MetricType};
use crate::types::{IndexStats, Key};

/// Index wrapper that adds automatic tracing to all operations
pub struct TracedIndex<I: Index> {
    inner: I,
    trace_id: Uuid,
    operation_count: u64,
}

impl<I: Index> TracedIndex<I> {
    /// Wrap an index engine with tracing
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            trace_id: Uuid::new_v4(),
            operation_count: 0,
        }
    }

    /// Get the current trace ID
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Get the number of operations performed
    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    /// Unwrap the inner engine
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Index> Index for TracedIndex<I> {
    type Value = I::Value;

    fn insert(&mut self, key: Key, value: I::Value) {
        self.operation_count += 1;
        let start = Instant::now();
        self.inner.insert(key, value);
        debug!(
            trace_id = %self.trace_id,
            key,
            elapsed_us = start.elapsed().as_micros() as u64,
            "index.insert"
        );
        count_operation();
    }

    fn search(&mut self, key: Key) -> Option<I::Value> {
        self.operation_count += 1;
        let start = Instant::now();
        let result = self.inner.search(key);
        debug!(
            trace_id = %self.trace_id,
            key,
            found = result.is_some(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "index.search"
        );
        record_metric(MetricType::Timer {
            name: "index.search.duration",
            duration: start.elapsed(),
        });
        count_operation();
        count_query();
        result
    }

    fn range_scan(&mut self, lo: Key, hi: Key, emit: &mut dyn FnMut(Key, &I::Value)) {
        self.operation_count += 1;
        let start = Instant::now();
        let mut emitted = 0u64;
        self.inner.range_scan(lo, hi, &mut |key, value| {
            emitted += 1;
            emit(key, value);
        });
        debug!(
            trace_id = %self.trace_id,
            lo,
            hi,
            emitted,
            elapsed_us = start.elapsed().as_micros() as u64,
            "index.range_scan"
        );
        record_metric(MetricType::Counter {
            name: "index.range_scan.emitted",
            value: emitted,
        });
        count_operation();
    }

    fn stats(&self) -> IndexStats {
        self.inner.stats()
    }
}
