//! Metrics sink: interface only. [`MetricsSink`] defines the counters and
//! histograms an embedding application would want at the same seams the
//! engine logs through `tracing` (detector evaluation, scoring, queue
//! writes, background task cycles), but the core does not hold or call a
//! sink anywhere yet — wiring one in, and deciding where to call it, is
//! left to the embedding application.
//!
//! A narrow trait with a no-op default and a `dashmap`-backed in-memory
//! implementation for tests and the demo binary's own summary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Counters and histograms the engine reports at evaluation and background
/// task boundaries. All methods are synchronous and must never block —
/// implementations that need to ship data off-process should buffer
/// internally.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &'static str, value: i64);
    fn record_histogram(&self, name: &'static str, value: f64);

    fn evaluation_completed(&self, action: crate::types::Action, duration_ms: f64) {
        self.increment_counter(
            match action {
                crate::types::Action::Pass => "evaluations_pass_total",
                crate::types::Action::Alert => "evaluations_alert_total",
                crate::types::Action::Block => "evaluations_block_total",
            },
            1,
        );
        self.record_histogram("evaluation_duration_ms", duration_ms);
    }

    fn rule_triggered(&self, rule_id: &str) {
        let _ = rule_id;
        self.increment_counter("rules_triggered_total", 1);
    }
}

/// Discards everything. Used wherever a [`MetricsSink`] is required but the
/// caller has no real backend (unit tests, the demo binary without
/// `--metrics`).
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn increment_counter(&self, _name: &'static str, _value: i64) {}
    fn record_histogram(&self, _name: &'static str, _value: f64) {}
}

/// In-process counters and running histogram sums, for the demo binary's
/// own summary printout and for tests asserting on call counts. Not meant
/// as a production metrics backend.
#[derive(Default)]
pub struct InMemoryMetricsSink {
    counters: DashMap<&'static str, AtomicI64>,
    histogram_sums: DashMap<&'static str, (AtomicI64, AtomicI64)>, // (sum*1000, count)
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters_snapshot(&self) -> HashMap<&'static str, i64> {
        self.counters.iter().map(|e| (*e.key(), e.value().load(Ordering::Relaxed))).collect()
    }

    pub fn histogram_average(&self, name: &'static str) -> Option<f64> {
        self.histogram_sums.get(name).map(|entry| {
            let (sum_milli, count) = entry.value();
            let count = count.load(Ordering::Relaxed);
            if count == 0 {
                0.0
            } else {
                (sum_milli.load(Ordering::Relaxed) as f64 / 1000.0) / count as f64
            }
        })
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn increment_counter(&self, name: &'static str, value: i64) {
        self.counters.entry(name).or_insert_with(|| AtomicI64::new(0)).fetch_add(value, Ordering::Relaxed);
    }

    fn record_histogram(&self, name: &'static str, value: f64) {
        let entry = self
            .histogram_sums
            .entry(name)
            .or_insert_with(|| (AtomicI64::new(0), AtomicI64::new(0)));
        let (sum_milli, count) = entry.value();
        sum_milli.fetch_add((value * 1000.0).round() as i64, Ordering::Relaxed);
        count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared-ownership convenience alias for passing a sink around the
/// orchestrator and background schedulers.
pub type SharedMetrics = Arc<dyn MetricsSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_calls() {
        let sink = InMemoryMetricsSink::new();
        sink.increment_counter("x", 1);
        sink.increment_counter("x", 2);
        assert_eq!(sink.counters_snapshot().get("x"), Some(&3));
    }

    #[test]
    fn histogram_average_reflects_recorded_values() {
        let sink = InMemoryMetricsSink::new();
        sink.record_histogram("latency", 10.0);
        sink.record_histogram("latency", 20.0);
        assert!((sink.histogram_average("latency").unwrap() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn evaluation_completed_routes_to_the_right_action_counter() {
        let sink = InMemoryMetricsSink::new();
        sink.evaluation_completed(crate::types::Action::Block, 5.0);
        assert_eq!(sink.counters_snapshot().get("evaluations_block_total"), Some(&1));
    }

    #[test]
    fn noop_sink_never_panics() {
        let sink = NoopMetricsSink;
        sink.increment_counter("anything", 1);
        sink.record_histogram("anything", 1.0);
    }
}
