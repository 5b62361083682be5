//! Error types for the media crate.
//!
//! `TransportError` never leaves this crate's lookup methods: every
//! failure is turned into the fallback image. `MediaError` covers setup.

use thiserror::Error;

/// Failure of a single media API request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, timeout or body read failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The API answered with a non-2xx status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// 2xx response whose body is not the expected JSON
    #[error("Malformed response body: {0}")]
    Decode(String),

    /// No network access configured
    #[error("Media lookups are offline")]
    Offline,
}

impl TransportError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Request(_) | TransportError::Status(_))
    }
}

/// Errors that can occur while setting up media lookups
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid media configuration: {0}")]
    Config(#[from] envy::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;
