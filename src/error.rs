//! Unified error handling for the streamsift crate
//!
//! Domain-specific errors live in [`crate::utils::error`]; this module wraps
//! them into a single [`Error`] and classifies every variant into an
//! [`ErrorCategory`] so the pipeline can decide locally how to recover.
//!
//! # Usage
//!
//! ```rust,ignore
//! use streamsift::error::{Error, ErrorCategory, SiftErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Transport => tracing::debug!(error = %err, "unreachable"),
//!         ErrorCategory::Malformed => tracing::trace!(error = %err, "skipped"),
//!         _ => tracing::error!(error = %err, "fatal"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::error::{FetchError, ParseError};

/// Common trait for all streamsift error types
pub trait SiftErrorTrait: std::error::Error {
    /// Check if the run can continue past this error
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Timeout, connection refused, DNS failure, non-200 status
    Transport,
    /// Malformed input lines or candidate metadata
    Malformed,
    /// Configuration errors
    Config,
    /// Reading the seed file or writing output files
    Storage,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short lowercase label used in structured log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Malformed => "malformed",
            Self::Config => "config",
            Self::Storage => "storage",
            Self::Other => "other",
        }
    }
}

impl SiftErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Malformed,
            _ => ErrorCategory::Transport,
        }
    }
}

impl SiftErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Malformed
    }
}

/// Unified error type for the streamsift crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Reading the seed file or writing the output files
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl SiftErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Io { .. } => false,
            Self::Config(_) => false,
            Self::Other(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Io { .. } => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other(_) => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

// Storage code reports through anyhow; an underlying I/O error keeps its
// category.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let context = format!("{err:#}");
        match err.downcast::<io::Error>() {
            Ok(source) => Self::Io { context, source },
            Err(_) => Self::Other(context),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
