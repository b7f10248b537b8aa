//! Detector configuration.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};

/// Configuration for event classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Vault flow size (fraction of vault value) above which a
    /// large transaction alert fires. Default: 0.1 (10%).
    #[serde(default = "default_large_vault_move_percent")]
    pub large_vault_move_percent: f64,
    /// Strategy flow size (fraction of strategy value) above which a
    /// large transaction alert fires. Default: 0.1 (10%).
    #[serde(default = "default_large_strategy_move_percent")]
    pub large_strategy_move_percent: f64,
    /// `|pnl| / amount` above which a significant PnL alert fires.
    /// Default: 0.01.
    #[serde(default = "default_pnl_threshold")]
    pub pnl_threshold: f64,
    /// Occurrences per window at which a high frequency alert fires.
    /// Default: 10.
    #[serde(default = "default_frequency_threshold")]
    pub frequency_threshold: usize,
    /// Sliding window length (ms). Default: 60,000 (1 minute).
    #[serde(default = "default_frequency_window_ms")]
    pub frequency_window_ms: u64,
}

fn default_large_vault_move_percent() -> f64 {
    0.1
}

fn default_large_strategy_move_percent() -> f64 {
    0.1
}

fn default_pnl_threshold() -> f64 {
    0.01
}

fn default_frequency_threshold() -> usize {
    10
}

fn default_frequency_window_ms() -> u64 {
    60_000
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            large_vault_move_percent: default_large_vault_move_percent(),
            large_strategy_move_percent: default_large_strategy_move_percent(),
            pnl_threshold: default_pnl_threshold(),
            frequency_threshold: default_frequency_threshold(),
            frequency_window_ms: default_frequency_window_ms(),
        }
    }
}

impl DetectorConfig {
    /// Validate configuration values.
    ///
    /// Thresholds must be finite and non-negative; the frequency threshold
    /// and window must be positive.
    pub fn validate(&self) -> DetectorResult<()> {
        for (name, value) in [
            ("large_vault_move_percent", self.large_vault_move_percent),
            ("large_strategy_move_percent", self.large_strategy_move_percent),
            ("pnl_threshold", self.pnl_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DetectorError::ConfigError(format!(
                    "{name} ({value}) must be a finite non-negative number"
                )));
            }
        }

        if self.frequency_threshold == 0 {
            return Err(DetectorError::ConfigError(
                "frequency_threshold must be at least 1".to_string(),
            ));
        }

        if self.frequency_window_ms == 0 || i64::try_from(self.frequency_window_ms).is_err() {
            return Err(DetectorError::ConfigError(format!(
                "frequency_window_ms ({}) out of range",
                self.frequency_window_ms
            )));
        }

        Ok(())
    }

    /// Large vault move threshold in percent.
    pub fn large_vault_threshold_percent(&self) -> f64 {
        self.large_vault_move_percent * 100.0
    }

    /// Large strategy move threshold in percent.
    pub fn large_strategy_threshold_percent(&self) -> f64 {
        self.large_strategy_move_percent * 100.0
    }

    /// Window length as shown in notifications, e.g. "60s".
    pub fn window_label(&self) -> String {
        let ms = self.frequency_window_ms;
        if ms % 1000 == 0 {
            format!("{}s", ms / 1000)
        } else {
            format!("{ms}ms")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.large_vault_threshold_percent(), 10.0);
        assert_eq!(config.frequency_threshold, 10);
        assert_eq!(config.window_label(), "60s");
    }

    #[test]
    fn test_window_label_sub_second() {
        let config = DetectorConfig {
            frequency_window_ms: 1500,
            ..Default::default()
        };
        assert_eq!(config.window_label(), "1500ms");
    }

    #[test]
    fn test_validate_negative_threshold() {
        let config = DetectorConfig {
            pnl_threshold: -0.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pnl_threshold"));
    }

    #[test]
    fn test_validate_non_finite_threshold() {
        let config = DetectorConfig {
            large_vault_move_percent: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_frequency() {
        let config = DetectorConfig {
            frequency_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            frequency_window_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
