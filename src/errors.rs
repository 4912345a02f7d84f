//! Error types for toolgate
//!
//! Every fault a tool call can hit is a `ToolError`. The dispatcher folds
//! them into the envelope through `ToolError::kind()`, so nothing escapes to
//! the caller as an unhandled fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for tool dispatch and the capability backends
#[derive(Error, Debug)]
pub enum ToolError {
    /// Bad path, identifier, or schema mismatch
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Required argument absent from the call
    #[error("Missing required argument: {name}")]
    MissingArgument { name: String },

    /// No tool registered under this name
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// Tool name registered twice
    #[error("Tool already registered: {name}")]
    AlreadyRegistered { name: String },

    /// Wall-clock budget exhausted
    #[error("Operation timed out after {limit_ms}ms")]
    TimedOut { limit_ms: u64 },

    /// Size ceiling exceeded
    #[error("Size limit exceeded: {actual} bytes (max {limit})")]
    Overflow { actual: u64, limit: u64 },

    /// Table, file, or resource absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fault surfaced by a capability backend
    #[error("{0}")]
    BackendFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    SqlError(#[from] rusqlite::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error classes rendered into the result envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    MissingArgument,
    UnknownTool,
    TimedOut,
    Overflow,
    BackendFailure,
    NotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::MissingArgument => "missing_argument",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::TimedOut => "timed_out",
            ErrorKind::Overflow => "overflow",
            ErrorKind::BackendFailure => "backend_failure",
            ErrorKind::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

impl ToolError {
    /// Envelope kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ToolError::MissingArgument { .. } => ErrorKind::MissingArgument,
            ToolError::UnknownTool { .. } => ErrorKind::UnknownTool,
            ToolError::TimedOut { .. } => ErrorKind::TimedOut,
            ToolError::Overflow { .. } => ErrorKind::Overflow,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            ToolError::HttpError(e) if e.is_timeout() => ErrorKind::TimedOut,
            ToolError::AlreadyRegistered { .. }
            | ToolError::BackendFailure(_)
            | ToolError::ConfigError(_)
            | ToolError::HttpError(_)
            | ToolError::SqlError(_)
            | ToolError::SerializationError(_)
            | ToolError::IoError(_) => ErrorKind::BackendFailure,
        }
    }

    /// Shorthand for an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidArgument(message.into())
    }

    /// Shorthand for a backend failure
    pub fn backend(message: impl Into<String>) -> Self {
        ToolError::BackendFailure(message.into())
    }
}
