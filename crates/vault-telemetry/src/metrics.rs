//! Prometheus metrics for vault alerting.
//!
//! Covers the path of a log line through the service:
//! - Decoding (accepted or discarded by reason)
//! - Classification (candidates by severity and type)
//! - Cooldown suppression
//! - Delivery outcome and latency per sink
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which is a programming error caught at first use on startup.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};
use vault_core::Severity;

use crate::error::{TelemetryError, TelemetryResult};

/// Input lines by decode outcome.
/// Labels: outcome (accepted/malformed/foreign_origin)
pub static LINES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vault_lines_total",
        "Total input lines by decode outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Alert candidates produced by the classifier.
pub static CANDIDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vault_alert_candidates_total",
        "Total alert candidates produced",
        &["severity", "alert_type"]
    )
    .unwrap()
});

/// Alert candidates dropped by cooldown.
pub static SUPPRESSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vault_alerts_suppressed_total",
        "Total alert candidates suppressed by cooldown",
        &["severity", "alert_type"]
    )
    .unwrap()
});

/// Delivery attempts by sink and outcome.
/// Labels: outcome (ok/failed)
pub static DELIVERIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vault_deliveries_total",
        "Total notification delivery attempts",
        &["sink", "outcome"]
    )
    .unwrap()
});

/// Delivery round trip in milliseconds.
pub static DELIVERY_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "vault_delivery_latency_ms",
        "Notification delivery latency in milliseconds",
        &["sink"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Keys held by the frequency tracker.
pub static TRACKED_FREQUENCY_KEYS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "vault_tracked_frequency_keys",
        "Number of (event kind, vault) keys in the frequency tracker"
    )
    .unwrap()
});

/// Entries held by the rate limiter.
pub static COOLDOWN_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "vault_cooldown_entries",
        "Number of cooldown keys in the rate limiter"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a decoded line.
    pub fn line_accepted() {
        LINES_TOTAL.with_label_values(&["accepted"]).inc();
    }

    /// Record a discarded line.
    pub fn line_discarded(reason: &str) {
        LINES_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record an alert candidate.
    pub fn candidate(severity: Severity, alert_type: &str) {
        CANDIDATES_TOTAL
            .with_label_values(&[severity.as_str(), alert_type])
            .inc();
    }

    /// Record a candidate suppressed by cooldown.
    pub fn suppressed(severity: Severity, alert_type: &str) {
        SUPPRESSED_TOTAL
            .with_label_values(&[severity.as_str(), alert_type])
            .inc();
    }

    /// Record a delivery outcome and its latency.
    pub fn delivery(sink: &str, ok: bool, latency_ms: f64) {
        let outcome = if ok { "ok" } else { "failed" };
        DELIVERIES_TOTAL.with_label_values(&[sink, outcome]).inc();
        DELIVERY_LATENCY_MS
            .with_label_values(&[sink])
            .observe(latency_ms);
    }

    /// Update state size gauges.
    pub fn state_sizes(tracked_frequency_keys: usize, cooldown_entries: usize) {
        TRACKED_FREQUENCY_KEYS.set(tracked_frequency_keys as i64);
        COOLDOWN_ENTRIES.set(cooldown_entries as i64);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
