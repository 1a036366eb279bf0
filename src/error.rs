//! Error types for verdict-dl
//!
//! The taxonomy mirrors the failure modes of a run:
//! - [`TransportError`] for a single failed HTTP attempt (retryable or not)
//! - [`TransportFailure`] for a request that gave up after its attempts
//! - [`Error::Write`] for local persistence failures
//! - [`Error::Abort`] for the one fatal condition: the verdict list could not be
//!   fetched, carrying the [`SearchError`] that caused it

use crate::search::SearchError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for verdict-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for verdict-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_attempts")
        key: Option<String>,
    },

    /// Writing an artifact to local storage failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// The final path that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The verdict list could not be obtained; nothing to act on
    #[error("run aborted: {source}")]
    Abort {
        /// Why the list-fetch failed
        #[source]
        source: SearchError,
    },

    /// Operation not allowed in the pipeline's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config<S: Into<String>>(key: &str, message: S) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Last HTTP status of an aborted list-fetch, if the server answered
    pub fn search_status(&self) -> Option<u16> {
        match self {
            Error::Abort {
                source: SearchError::Transport(failure),
            } => failure.last.status(),
            _ => None,
        }
    }

    /// Build a write error for the given path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

/// A single failed HTTP attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Request did not complete within its timeout
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// TCP/TLS connection could not be established
    #[error("connection to {url} failed: {message}")]
    Connect {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },

    /// Connection dropped while reading the response body
    #[error("failed to read response body from {url}: {message}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },

    /// Request could not be built or sent (bad URL, redirect loop, ...)
    #[error("request to {url} failed: {message}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },
}

impl TransportError {
    /// HTTP status carried by this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a reqwest error raised for `url`
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            TransportError::Timeout { url }
        } else if e.is_connect() {
            TransportError::Connect {
                url,
                message: e.to_string(),
            }
        } else if e.is_body() || e.is_decode() {
            TransportError::Body {
                url,
                message: e.to_string(),
            }
        } else {
            TransportError::Request {
                url,
                message: e.to_string(),
            }
        }
    }
}

/// An HTTP request that gave up, with the last observed error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{last} (after {attempts} attempt(s))")]
pub struct TransportFailure {
    /// Number of attempts actually made
    pub attempts: u32,
    /// Error from the final attempt
    pub last: TransportError,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_display_includes_attempts_and_status() {
        let failure = TransportFailure {
            attempts: 3,
            last: TransportError::Status {
                url: "http://host/list".to_string(),
                status: 503,
            },
        };
        assert_eq!(
            failure.to_string(),
            "HTTP 503 from http://host/list (after 3 attempt(s))"
        );
        assert_eq!(failure.last.status(), Some(503));
    }

    #[test]
    fn config_error_carries_key() {
        let err = Error::config("retry.max_attempts", "must be at least 1");
        match err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("retry.max_attempts"));
                assert_eq!(message, "must be at least 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn abort_keeps_the_failed_request_as_source() {
        use std::error::Error as _;

        let err = Error::Abort {
            source: SearchError::Transport(TransportFailure {
                attempts: 3,
                last: TransportError::Status {
                    url: "http://host/list".to_string(),
                    status: 503,
                },
            }),
        };

        assert_eq!(
            err.to_string(),
            "run aborted: HTTP 503 from http://host/list (after 3 attempt(s))"
        );
        assert!(err.source().is_some());
        assert_eq!(err.search_status(), Some(503));
    }

    #[test]
    fn write_error_names_path() {
        let err = Error::write(
            "/tmp/out/metadata.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out/metadata.json"));
    }
}
