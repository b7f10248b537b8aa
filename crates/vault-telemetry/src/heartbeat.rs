//! Liveness heartbeat.
//!
//! Summarizes uptime, state sizes and the process-wide counters. The report
//! is observability only; nothing reads it back.

use crate::metrics::{CANDIDATES_TOTAL, DELIVERIES_TOTAL, LINES_TOTAL, SUPPRESSED_TOTAL};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use prometheus::CounterVec;
use serde::Serialize;
use tracing::info;

/// Point-in-time liveness figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivenessSnapshot {
    pub uptime_secs: i64,
    pub tracked_frequency_keys: usize,
    pub cooldown_entries: usize,
    pub lines_accepted: u64,
    pub lines_malformed: u64,
    pub lines_foreign: u64,
    pub candidates: u64,
    pub suppressed: u64,
    pub deliveries_ok: u64,
    pub deliveries_failed: u64,
}

/// Liveness reporter.
pub struct LivenessReporter {
    start_time: DateTime<Utc>,
}

impl Default for LivenessReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessReporter {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
        }
    }

    /// Collect current figures. State sizes come from the caller, which owns
    /// the tracker and limiter.
    pub fn snapshot(&self, tracked_frequency_keys: usize, cooldown_entries: usize) -> LivenessSnapshot {
        LivenessSnapshot {
            uptime_secs: (Utc::now() - self.start_time).num_seconds(),
            tracked_frequency_keys,
            cooldown_entries,
            lines_accepted: counter_sum(&LINES_TOTAL, Some(("outcome", "accepted"))),
            lines_malformed: counter_sum(&LINES_TOTAL, Some(("outcome", "malformed"))),
            lines_foreign: counter_sum(&LINES_TOTAL, Some(("outcome", "foreign_origin"))),
            candidates: counter_sum(&CANDIDATES_TOTAL, None),
            suppressed: counter_sum(&SUPPRESSED_TOTAL, None),
            deliveries_ok: counter_sum(&DELIVERIES_TOTAL, Some(("outcome", "ok"))),
            deliveries_failed: counter_sum(&DELIVERIES_TOTAL, Some(("outcome", "failed"))),
        }
    }

    /// Log a heartbeat line.
    pub fn report(&self, tracked_frequency_keys: usize, cooldown_entries: usize) -> LivenessSnapshot {
        let s = self.snapshot(tracked_frequency_keys, cooldown_entries);
        info!(
            uptime_secs = s.uptime_secs,
            tracked_frequency_keys = s.tracked_frequency_keys,
            cooldown_entries = s.cooldown_entries,
            lines_accepted = s.lines_accepted,
            lines_malformed = s.lines_malformed,
            lines_foreign = s.lines_foreign,
            candidates = s.candidates,
            suppressed = s.suppressed,
            deliveries_ok = s.deliveries_ok,
            deliveries_failed = s.deliveries_failed,
            "Heartbeat"
        );
        s
    }
}

/// Sum a counter over all label sets, optionally restricted to one label value.
fn counter_sum(counter: &CounterVec, label: Option<(&str, &str)>) -> u64 {
    let mut total = 0.0;
    for mf in counter.collect() {
        for m in mf.get_metric() {
            let matches = match label {
                Some((name, value)) => m
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == name && pair.get_value() == value),
                None => true,
            };
            if matches {
                total += m.get_counter().get_value();
            }
        }
    }
    total as u64
}
