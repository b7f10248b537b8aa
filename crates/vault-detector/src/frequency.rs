//! Sliding-window event frequency tracking.
//!
//! Keeps the exact occurrence timestamps per (event kind, vault) over the
//! trailing window. Counts are exact; there is no bucketing.

use std::collections::{HashMap, VecDeque};
use tracing::debug;
use vault_core::EventKind;

/// Tracker key: event kind and vault.
pub type FrequencyKey = (EventKind, String);

/// Per-key sliding windows of occurrence timestamps (ms).
///
/// Timestamps in a window are strictly increasing and all newer than
/// `now - window_ms` after every read. Keys whose window empties are kept
/// until `prune_expired` runs, so bursty keys do not churn allocations.
pub struct FrequencyTracker {
    window_ms: i64,
    windows: HashMap<FrequencyKey, VecDeque<i64>>,
}

impl FrequencyTracker {
    /// Create a tracker with a window of `window_ms` milliseconds.
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            windows: HashMap::new(),
        }
    }

    /// Record an occurrence at `now_ms` and return the count inside the window.
    ///
    /// An occurrence at or before the previous one for the same key is
    /// recorded 1 ms after it to keep the window strictly increasing.
    pub fn record(&mut self, kind: &EventKind, vault: &str, now_ms: i64) -> usize {
        let cutoff = now_ms - self.window_ms;
        let window = self
            .windows
            .entry((kind.clone(), vault.to_string()))
            .or_default();

        Self::drop_expired(window, cutoff);

        let ts = match window.back() {
            Some(&last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        window.push_back(ts);

        window.len()
    }

    /// Current count for a key without recording.
    pub fn count(&mut self, kind: &EventKind, vault: &str, now_ms: i64) -> usize {
        let cutoff = now_ms - self.window_ms;
        match self.windows.get_mut(&(kind.clone(), vault.to_string())) {
            Some(window) => {
                Self::drop_expired(window, cutoff);
                window.len()
            }
            None => 0,
        }
    }

    /// Drop expired timestamps for every key and remove emptied keys.
    ///
    /// Returns the number of keys removed.
    pub fn prune_expired(&mut self, now_ms: i64) -> usize {
        let cutoff = now_ms - self.window_ms;
        let before = self.windows.len();

        self.windows.retain(|_, window| {
            Self::drop_expired(window, cutoff);
            !window.is_empty()
        });

        let removed = before - self.windows.len();
        debug!(
            removed,
            remaining = self.windows.len(),
            "Pruned frequency windows"
        );
        removed
    }

    /// Number of keys currently held.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    fn drop_expired(window: &mut VecDeque<i64>, cutoff: i64) {
        while window.front().is_some_and(|&t| t <= cutoff) {
            window.pop_front();
        }
    }
}
