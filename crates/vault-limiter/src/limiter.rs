//! Cooldown rate limiter.
//!
//! Remembers when each alert key last went out. A suppressed attempt never
//! moves the stored timestamp, so the cooldown is anchored to the last
//! successful emission.

use crate::config::CooldownConfig;
use std::collections::HashMap;
use tracing::debug;
use vault_core::{AlertCandidate, Severity};

/// Cooldown class key.
///
/// Different alert types on one vault, or one type on different vaults,
/// are limited independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub severity: Severity,
    pub alert_type: String,
    pub vault: String,
}

impl CooldownKey {
    pub fn new(severity: Severity, alert_type: impl Into<String>, vault: impl Into<String>) -> Self {
        Self {
            severity,
            alert_type: alert_type.into(),
            vault: vault.into(),
        }
    }

    /// Key of an alert candidate.
    pub fn for_candidate(candidate: &AlertCandidate) -> Self {
        Self::new(
            candidate.severity(),
            candidate.alert_type(),
            candidate.vault(),
        )
    }
}

/// Last emission time (ms) per cooldown key.
pub struct RateLimiter {
    config: CooldownConfig,
    last_emitted: HashMap<CooldownKey, i64>,
}

impl RateLimiter {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            config,
            last_emitted: HashMap::new(),
        }
    }

    /// Admit an emission for `key` at `now_ms`.
    ///
    /// Succeeds when the key has no prior emission or more than
    /// `cooldown_ms` has elapsed since it, and records `now_ms` then.
    /// On failure the stored timestamp is left as is.
    pub fn admit(&mut self, key: CooldownKey, cooldown_ms: i64, now_ms: i64) -> bool {
        match self.last_emitted.get_mut(&key) {
            Some(last) if now_ms - *last <= cooldown_ms => {
                debug!(
                    severity = %key.severity,
                    alert_type = %key.alert_type,
                    vault = %key.vault,
                    elapsed_ms = now_ms - *last,
                    cooldown_ms,
                    "Alert suppressed by cooldown"
                );
                false
            }
            Some(last) => {
                *last = now_ms;
                true
            }
            None => {
                self.last_emitted.insert(key, now_ms);
                true
            }
        }
    }

    /// Admit a candidate using the cooldown of its severity class.
    pub fn admit_candidate(&mut self, candidate: &AlertCandidate, now_ms: i64) -> bool {
        let cooldown_ms = self.config.cooldown_for(candidate.severity());
        self.admit(CooldownKey::for_candidate(candidate), cooldown_ms, now_ms)
    }

    /// Remove entries last emitted more than `retention_ms` ago.
    ///
    /// Returns the number of entries removed.
    pub fn prune_older_than(&mut self, retention_ms: i64, now_ms: i64) -> usize {
        let before = self.last_emitted.len();
        self.last_emitted
            .retain(|_, &mut last| now_ms - last <= retention_ms);

        let removed = before - self.last_emitted.len();
        debug!(
            removed,
            remaining = self.last_emitted.len(),
            "Pruned cooldown entries"
        );
        removed
    }

    /// Prune with the configured retention.
    pub fn prune(&mut self, now_ms: i64) -> usize {
        self.prune_older_than(self.config.retention_ms, now_ms)
    }

    /// Last successful emission for a key.
    pub fn last_emitted(&self, key: &CooldownKey) -> Option<i64> {
        self.last_emitted.get(key).copied()
    }

    /// Number of keys with a recorded emission.
    pub fn entries(&self) -> usize {
        self.last_emitted.len()
    }
}
