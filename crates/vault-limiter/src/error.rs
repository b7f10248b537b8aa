//! Limiter error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type LimiterResult<T> = Result<T, LimiterError>;
