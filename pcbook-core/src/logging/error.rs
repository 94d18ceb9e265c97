//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur while installing the global subscriber
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    /// A subscriber was already installed, or the layers failed to build
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Unknown level or malformed filter directive
    #[error("Invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}
