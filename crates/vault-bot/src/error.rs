//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] vault_feed::FeedError),

    #[error("Detector error: {0}")]
    Detector(#[from] vault_detector::DetectorError),

    #[error("Limiter error: {0}")]
    Limiter(#[from] vault_limiter::LimiterError),

    #[error("Notify error: {0}")]
    Notify(#[from] vault_notify::NotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] vault_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
