//! Error types for the adaptive quality controller.
//!
//! Each component gets its own error enum with descriptive messages;
//! `AppError` aggregates the ones the demo binary can hit.

use thiserror::Error;

/// Errors related to quality level handling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    #[error("Invalid quality level '{0}', expected one of: ultra, high, medium, low")]
    InvalidLevel(String),

    #[error("Invalid target FPS {0}, must be a positive finite number")]
    InvalidTargetFps(f64),
}

/// Errors related to configuration management.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Errors related to logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Could not determine the local data directory")]
    DataDirectoryNotFound,

    #[error("Failed to create log directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create log file appender: {0}")]
    AppenderCreationFailed(String),
}

/// Top-level application errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}
