//! Error types for the DDNS agent
//!
//! This module defines all error types used throughout the workspace.
//! "Address not found" is deliberately absent: discovery reports absence
//! through [`crate::DiscoveredAddress::NotFound`], not through an error.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS agent
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP errors (DNS resolution, connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error came from parsing a response body
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Json(_))
    }
}
