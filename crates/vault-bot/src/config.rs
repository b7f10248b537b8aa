//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vault_detector::DetectorConfig;
use vault_feed::DEFAULT_ORIGIN;
use vault_limiter::CooldownConfig;
use vault_notify::TelegramConfig;

/// Environment prefix for overrides, e.g. `VAULTWATCH__TELEGRAM__BOT_TOKEN`.
pub const ENV_PREFIX: &str = "VAULTWATCH";

/// Delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Log notifications instead of sending them.
    DryRun,
    /// Send notifications to Telegram.
    #[default]
    Live,
}

/// Ingestion source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listener log file to follow.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Origin tag (`service` field) of lines to accept.
    #[serde(default = "default_expected_origin")]
    pub expected_origin: String,
    /// Poll interval (ms). Default: 500.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Replay existing content on startup instead of starting at the end.
    #[serde(default)]
    pub read_from_start: bool,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/vault-listener.log")
}

fn default_expected_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            expected_origin: default_expected_origin(),
            poll_interval_ms: default_poll_interval_ms(),
            read_from_start: false,
        }
    }
}

impl SourceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Maintenance intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Frequency tracker pruning (ms). Default: 60,000.
    #[serde(default = "default_frequency_prune_interval_ms")]
    pub frequency_prune_interval_ms: u64,
    /// Cooldown pruning (ms). Default: 600,000 (10 minutes).
    #[serde(default = "default_cooldown_prune_interval_ms")]
    pub cooldown_prune_interval_ms: u64,
    /// Liveness heartbeat (ms). Default: 3,600,000 (1 hour).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_frequency_prune_interval_ms() -> u64 {
    60_000
}

fn default_cooldown_prune_interval_ms() -> u64 {
    600_000
}

fn default_heartbeat_interval_ms() -> u64 {
    3_600_000
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            frequency_prune_interval_ms: default_frequency_prune_interval_ms(),
            cooldown_prune_interval_ms: default_cooldown_prune_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directives used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Delivery mode.
    #[serde(default)]
    pub mode: DeliveryMode,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub cooldown: CooldownConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from an optional TOML file overlaid with `VAULTWATCH__*`
    /// environment variables. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(Self::env_source())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse TOML text overlaid with the environment.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .add_source(Self::env_source())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn env_source() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    /// Mode actually used: live without a bot token runs dry.
    pub fn effective_mode(&self) -> DeliveryMode {
        match self.mode {
            DeliveryMode::Live if self.telegram.token().is_none() => DeliveryMode::DryRun,
            mode => mode,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        self.detector.validate()?;
        self.cooldown.validate()?;

        if self.source.expected_origin.trim().is_empty() {
            return Err(AppError::Config(
                "source.expected_origin must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("source.poll_interval_ms", self.source.poll_interval_ms),
            (
                "maintenance.frequency_prune_interval_ms",
                self.maintenance.frequency_prune_interval_ms,
            ),
            (
                "maintenance.cooldown_prune_interval_ms",
                self.maintenance.cooldown_prune_interval_ms,
            ),
            (
                "maintenance.heartbeat_interval_ms",
                self.maintenance.heartbeat_interval_ms,
            ),
            ("telegram.timeout_ms", self.telegram.timeout_ms),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!("{name} must be positive")));
            }
        }

        if self.mode == DeliveryMode::Live
            && self.telegram.token().is_some()
            && self.telegram.chat().is_none()
        {
            return Err(AppError::Config(
                "telegram.chat_id is required when a bot token is set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, DeliveryMode::Live);
        // No token configured
        assert_eq!(config.effective_mode(), DeliveryMode::DryRun);
        assert_eq!(config.source.expected_origin, "vault-listener");
        assert_eq!(config.source.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.maintenance.heartbeat_interval_ms, 3_600_000);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AppConfig::from_toml_str(
            r#"
            mode = "dry_run"

            [source]
            log_path = "/var/log/listener.log"
            read_from_start = true

            [detector]
            pnl_threshold = 0.05
            frequency_threshold = 3

            [cooldown]
            info_cooldown_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, DeliveryMode::DryRun);
        assert_eq!(config.source.log_path, PathBuf::from("/var/log/listener.log"));
        assert!(config.source.read_from_start);
        assert_eq!(config.source.poll_interval_ms, 500);
        assert_eq!(config.detector.pnl_threshold, 0.05);
        assert_eq!(config.detector.frequency_threshold, 3);
        assert_eq!(config.detector.large_vault_move_percent, 0.1);
        assert_eq!(config.cooldown.info_cooldown_ms, 1000);
        assert_eq!(config.cooldown.critical_cooldown_ms, 300_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/vaultwatch.toml").unwrap();
        assert_eq!(config.detector.frequency_window_ms, 60_000);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vaultwatch.toml");
        std::fs::write(
            &path,
            "[telegram]\nbot_token = \"123:abc\"\nchat_id = \"-100\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.effective_mode(), DeliveryMode::Live);
        assert_eq!(config.telegram.chat(), Some("-100"));
    }

    #[test]
    fn test_token_without_chat_rejected() {
        let mut config = AppConfig::default();
        config.telegram.bot_token = Some("123:abc".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chat_id"));

        // Dry run never sends, so the chat id is not needed
        config.mode = DeliveryMode::DryRun;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = AppConfig::default();
        config.maintenance.cooldown_prune_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cooldown_prune_interval_ms"));
    }

    #[test]
    fn test_invalid_detector_rejected() {
        let mut config = AppConfig::default();
        config.detector.frequency_threshold = 0;
        assert!(matches!(config.validate(), Err(AppError::Detector(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("mode"));
        assert!(toml_str.contains("[detector]"));
    }
}
