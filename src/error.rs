//! Error types for urlcat.
//!
//! This module defines all error types that can occur while converting a set
//! of URLs into one merged PDF. Errors carry enough context (paths, request
//! indices, URLs) to be logged once at the request boundary.
//!
//! # Error Categories
//!
//! - **Validation Errors**: missing URL list or target directory
//! - **Render Errors**: a single URL failed to render (non-fatal per request)
//! - **Merge Errors**: an artifact was unreadable or corrupt at merge time
//! - **Total Failure**: every render of a request failed
//! - **I/O Errors**: output could not be created or written

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for urlcat operations.
pub type Result<T> = std::result::Result<T, UrlCatError>;

/// Failure of a single render attempt.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The requested URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The render options cannot be turned into renderer arguments.
    #[error("invalid render options: {reason}")]
    InvalidOptions {
        /// Which option was rejected and why.
        reason: String,
    },

    /// The renderer executable could not be found.
    #[error("renderer unavailable: {0}")]
    NotFound(#[source] io::Error),

    /// The renderer ran but reported failure.
    #[error("renderer invocation failed (exit {exit_code:?}): {stderr}")]
    Cli {
        /// Process exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The renderer reported success but produced no document.
    #[error("renderer produced no output at {}", path.display())]
    EmptyOutput {
        /// Destination that should have held the PDF.
        path: PathBuf,
    },

    /// The render did not settle within the configured timeout.
    #[error("render timed out after {}s", after.as_secs_f64())]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// Generic I/O failure while rendering.
    #[error("I/O error while rendering: {0}")]
    Io(#[from] io::Error),
}

/// Main error type for urlcat operations.
#[derive(Debug, thiserror::Error)]
pub enum UrlCatError {
    /// The conversion request is missing required input.
    #[error("Invalid request: {message}")]
    Validation {
        /// What is missing or malformed.
        message: String,
    },

    /// A single URL failed to render.
    #[error("Failed to render #{index} ({url}): {source}")]
    Render {
        /// Original request index of the URL.
        index: usize,
        /// The URL that failed.
        url: String,
        /// Underlying render failure.
        #[source]
        source: RenderError,
    },

    /// Every render of a request failed; nothing to assemble.
    #[error("All {attempted} PDF render(s) failed, no document produced")]
    TotalFailure {
        /// Number of URLs that were attempted.
        attempted: usize,
    },

    /// Failed to load a PDF artifact.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF artifact is corrupted or has invalid structure.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", path.display())]
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// Merge operation failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid service configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for UrlCatError {
    fn from(err: lopdf::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for UrlCatError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::other(format!("Background task failed: {err}"))
    }
}

impl UrlCatError {
    /// Create a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Stable, machine-readable code for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Render { .. } => "render",
            Self::TotalFailure { .. } => "total_failure",
            Self::FailedToLoadPdf { .. } | Self::CorruptedPdf { .. } | Self::MergeFailed { .. } => {
                "merge"
            }
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Io { .. } => {
                "io"
            }
            Self::InvalidConfig { .. } => "config",
            Self::Other { .. } => "other",
        }
    }
}
