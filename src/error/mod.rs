//! Error handling module for yt-trimmer

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for yt-trimmer operations
#[derive(Error, Debug)]
pub enum TrimmerError {
    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS")]
    InvalidTimeFormat { time: String },

    /// Time range validation error
    #[error("Invalid time range: start ({start}) must be less than end ({end})")]
    InvalidTimeRange { start: String, end: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Logging initialization error
    #[error("Failed to initialize logging: {message}")]
    LoggingError { message: String },

    /// Relay server error
    #[error("Relay server error: {message}")]
    ServerError { message: String },

    /// Domain error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// TOML parse error
    #[error("Failed to parse TOML config: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to serialize TOML config: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for yt-trimmer operations
pub type TrimmerResult<T> = std::result::Result<T, TrimmerError>;
