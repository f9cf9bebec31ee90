//! Error types for the streamsift pipeline
//!
//! This module defines the per-item error types used by the network adapters
//! and the line/metadata parsers. None of them abort a run: callers classify
//! them and recover locally.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport error (connection refused, DNS failure, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response arrived with an unexpected status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a reqwest error, folding timeouts into [`FetchError::Timeout`]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Errors that can occur while parsing lines and candidate metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not match `name,url`
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    /// Date is not in `MM-DD-YYYY` form
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Resolution has no `WxH` component
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// Candidate has no URL
    #[error("Candidate has no URL")]
    MissingUrl,

    /// Harvested hit carries no channel name
    #[error("Candidate has no channel name")]
    MissingChannelName,
}
