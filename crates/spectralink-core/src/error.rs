//! Error types for the message exchange core.
//!
//! Codec failures never surface here: the codec reports them through sentinel
//! values. These errors cover the collaborator boundary only.

use std::io;
use thiserror::Error;

/// Result type for SpectraLink client operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur while talking to the collaborator server.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation timed out")]
    Timeout,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ChatError::Timeout;
        }
        if let Some(status) = err.status() {
            return ChatError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        ChatError::Http(err.to_string())
    }
}

impl From<url::ParseError> for ChatError {
    fn from(err: url::ParseError) -> Self {
        ChatError::Config(format!("invalid server url: {}", err))
    }
}

impl ChatError {
    /// Check if the same request is worth sending again unchanged.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Status { status, .. } => {
                matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
            }
            ChatError::Timeout | ChatError::Io(_) | ChatError::Http(_) => true,
            _ => false,
        }
    }
}
