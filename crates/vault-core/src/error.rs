//! Error types for vault-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Empty vault identifier")]
    EmptyVault,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
