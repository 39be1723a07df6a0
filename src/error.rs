//! Error types for the quantum lab

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, LabError>;

/// One entry of a structured validation error returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `body.configuration.ansatz`
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Quantum lab error types
#[derive(Error, Debug)]
pub enum LabError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unknown system: {0}")]
    UnknownSystem(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LabError::Parse(err.to_string())
        } else {
            LabError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for LabError {
    fn from(err: toml::de::Error) -> Self {
        LabError::Config(err.to_string())
    }
}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::Config(err.to_string())
    }
}
