//! Metrics sink boundary and in-process aggregates
//!
//! Emission is fire-and-forget: sinks never error and never block the
//! pipeline. Metric names used by the pipeline:
//!
//! - `pipeline.requests` / `pipeline.replans` / `pipeline.retries`
//! - `pipeline.llm_calls` / `pipeline.tool_calls`
//! - `pipeline.cache_hits` / `pipeline.rag_unavailable`
//! - `node.latency_ms` (with a `node` label)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fire-and-forget metrics boundary
pub trait MetricsSink: Send + Sync {
    fn record(&self, name: &str, value: f64, labels: &[(&str, &str)]);
}

/// Sink that emits metrics as debug log lines
#[derive(Debug, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn record(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        debug!(metric = %name, value, ?labels, "metric");
    }
}

/// Atomic counter aggregate for the pipeline's own metrics
///
/// Doubles as a [`MetricsSink`]: counter-style metrics bump the matching
/// counter, everything else falls through to a debug line.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    requests: AtomicU64,
    replans: AtomicU64,
    retries: AtomicU64,
    llm_calls: AtomicU64,
    tool_calls: AtomicU64,
    cache_hits: AtomicU64,
    rag_unavailable: AtomicU64,
}

/// Point-in-time snapshot of [`PipelineMetrics`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub replans: u64,
    pub retries: u64,
    pub llm_calls: u64,
    pub tool_calls: u64,
    pub cache_hits: u64,
    pub rag_unavailable: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            replans: self.replans.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            llm_calls: self.llm_calls.load(Ordering::Relaxed),
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            rag_unavailable: self.rag_unavailable.load(Ordering::Relaxed),
        }
    }

    fn counter(&self, name: &str) -> Option<&AtomicU64> {
        match name {
            "pipeline.requests" => Some(&self.requests),
            "pipeline.replans" => Some(&self.replans),
            "pipeline.retries" => Some(&self.retries),
            "pipeline.llm_calls" => Some(&self.llm_calls),
            "pipeline.tool_calls" => Some(&self.tool_calls),
            "pipeline.cache_hits" => Some(&self.cache_hits),
            "pipeline.rag_unavailable" => Some(&self.rag_unavailable),
            _ => None,
        }
    }
}

impl MetricsSink for PipelineMetrics {
    fn record(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        match self.counter(name) {
            Some(counter) => {
                counter.fetch_add(value as u64, Ordering::Relaxed);
            }
            None => {
                debug!(metric = %name, value, ?labels, "metric");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = PipelineMetrics::new();
        metrics.record("pipeline.requests", 1.0, &[]);
        metrics.record("pipeline.requests", 1.0, &[]);
        metrics.record("pipeline.replans", 2.0, &[]);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.replans, 2);
        assert_eq!(snap.retries, 0);
    }

    #[test]
    fn test_unknown_metric_does_not_panic() {
        let metrics = PipelineMetrics::new();
        metrics.record("node.latency_ms", 12.5, &[("node", "plan")]);
        assert_eq!(metrics.snapshot().requests, 0);
    }

    #[test]
    fn test_log_sink_is_silent_success() {
        let sink = LogMetricsSink;
        sink.record("pipeline.requests", 1.0, &[("domain", "it")]);
    }
}
