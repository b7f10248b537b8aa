//! Delivery error types.

use thiserror::Error;

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Sink is missing required settings
    #[error("Sink not configured: {0}")]
    NotConfigured(String),

    /// Remote API rejected the message
    #[error("API error (status {status}): {description}")]
    Api { status: u16, description: String },

    #[error("{0}")]
    Other(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;
