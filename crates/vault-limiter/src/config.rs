//! Cooldown configuration.

use crate::error::{LimiterError, LimiterResult};
use serde::{Deserialize, Serialize};
use vault_core::Severity;

/// Cooldowns per severity class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Minimum gap between two Info alerts of the same key (ms).
    /// Default: 30,000.
    #[serde(default = "default_info_cooldown_ms")]
    pub info_cooldown_ms: i64,
    /// Minimum gap between two critical alerts of the same key (ms).
    /// Default: 300,000 (5 minutes).
    #[serde(default = "default_critical_cooldown_ms")]
    pub critical_cooldown_ms: i64,
    /// Entries older than this are dropped by maintenance (ms).
    /// Default: 86,400,000 (24 hours).
    #[serde(default = "default_retention_ms")]
    pub retention_ms: i64,
}

fn default_info_cooldown_ms() -> i64 {
    30_000
}

fn default_critical_cooldown_ms() -> i64 {
    300_000
}

fn default_retention_ms() -> i64 {
    86_400_000
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            info_cooldown_ms: default_info_cooldown_ms(),
            critical_cooldown_ms: default_critical_cooldown_ms(),
            retention_ms: default_retention_ms(),
        }
    }
}

impl CooldownConfig {
    /// Cooldown for a severity class.
    pub fn cooldown_for(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Info => self.info_cooldown_ms,
            Severity::Critical => self.critical_cooldown_ms,
        }
    }

    /// Validate configuration values.
    ///
    /// Retention must cover the longest cooldown, otherwise pruning would
    /// forget active cooldowns.
    pub fn validate(&self) -> LimiterResult<()> {
        if self.info_cooldown_ms < 0 || self.critical_cooldown_ms < 0 {
            return Err(LimiterError::ConfigError(
                "cooldowns must not be negative".to_string(),
            ));
        }

        let longest = self.info_cooldown_ms.max(self.critical_cooldown_ms);
        if self.retention_ms < longest {
            return Err(LimiterError::ConfigError(format!(
                "retention_ms ({}) must be at least the longest cooldown ({longest})",
                self.retention_ms
            )));
        }

        Ok(())
    }
}
