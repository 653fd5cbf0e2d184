// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Required input missing or malformed; no network call was made
    Validation(String),
    /// Remote service answered with a non-success status or error envelope
    Upstream {
        status: u16,
        message: Option<String>,
    },
    /// Connection, timeout or undecodable-body failure talking to a remote service
    Network(String),
    /// User-entered time text could not be parsed
    Parse(String),
    /// Invalid configuration value
    Config(String),
    /// Sequence already holds the maximum number of clips
    SequenceFull(usize),
    /// Index outside the current sequence
    IndexOutOfRange { index: usize, len: usize },
    /// No item carries the given identifier
    UnknownItem(String),
}

impl DomainError {
    /// Message suitable for showing to the user.
    ///
    /// Network failures never expose the underlying error text.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Network(_) => "Network error, please try again".to_string(),
            DomainError::Upstream {
                message: Some(msg), ..
            } => msg.clone(),
            DomainError::Upstream { message: None, .. } => "Upstream request failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            DomainError::Upstream {
                status,
                message: Some(msg),
            } => write!(f, "Upstream error ({}): {}", status, msg),
            DomainError::Upstream {
                status,
                message: None,
            } => write!(f, "Upstream error ({})", status),
            DomainError::Network(msg) => write!(f, "Network error: {}", msg),
            DomainError::Parse(msg) => write!(f, "Parse error: {}", msg),
            DomainError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            DomainError::SequenceFull(max) => {
                write!(f, "Sequence already holds the maximum of {} clips", max)
            }
            DomainError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for sequence of length {}", index, len)
            }
            DomainError::UnknownItem(id) => write!(f, "No clip with id {}", id),
        }
    }
}

impl std::error::Error for DomainError {}
