//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {message}")]
    Load { path: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}
