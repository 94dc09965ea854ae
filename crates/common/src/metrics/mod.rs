//! Metrics and observability utilities
//!
//! Provides walk and lookup metrics with standardized naming conventions.
//! Recording is a no-op until a recorder (e.g. the Prometheus exporter) is
//! installed by the binary.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all citesurf metrics
pub const METRICS_PREFIX: &str = "citesurf";

/// Buckets for lookup latency (network bound, typically slow)
pub const LOOKUP_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_walk_steps_total", METRICS_PREFIX),
        Unit::Count,
        "Total walk steps by transition kind"
    );

    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Documents held in the graph store"
    );

    describe_counter!(
        format!("{}_lookups_total", METRICS_PREFIX),
        Unit::Count,
        "Total identifier lookups by provider and outcome"
    );

    describe_histogram!(
        format!("{}_lookup_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Identifier lookup latency in seconds"
    );

    describe_counter!(
        format!("{}_skipped_references_total", METRICS_PREFIX),
        Unit::Count,
        "References skipped during a step (no identifier or lookup failure)"
    );

    tracing::info!("Metrics registered");
}

/// Helper to time a single lookup
pub struct LookupTimer {
    start: Instant,
    provider: String,
}

impl LookupTimer {
    /// Start timing a lookup against `provider`
    pub fn start(provider: &str) -> Self {
        Self {
            start: Instant::now(),
            provider: provider.to_string(),
        }
    }

    /// Record lookup completion
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64();
        let status = if success { "success" } else { "error" };

        counter!(
            format!("{}_lookups_total", METRICS_PREFIX),
            "provider" => self.provider.clone(),
            "status" => status
        )
        .increment(1);

        histogram!(
            format!("{}_lookup_duration_seconds", METRICS_PREFIX),
            "provider" => self.provider
        )
        .record(duration);
    }
}

/// Helper to record one walk step
pub fn record_step(transition: &'static str, graph_size: usize) {
    counter!(
        format!("{}_walk_steps_total", METRICS_PREFIX),
        "transition" => transition
    )
    .increment(1);

    gauge!(format!("{}_graph_nodes", METRICS_PREFIX)).set(graph_size as f64);
}

/// Helper to record a skipped reference
pub fn record_skipped_reference(reason: &'static str) {
    counter!(
        format!("{}_skipped_references_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(1);
}
