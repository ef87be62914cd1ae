//! Error types for subtitlarr
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (scan, external fetch, admission, config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for subtitlarr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for subtitlarr
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "schedule_interval_minutes")
        key: Option<String>,
    },

    /// A download task was requested while another one is running
    #[error("A download task is already in progress.")]
    TaskInProgress,

    /// Enumerating video files under a search path failed
    #[error("error scanning {path}: {reason}")]
    Scan {
        /// The search root that could not be walked
        path: PathBuf,
        /// Why the walk failed
        reason: String,
    },

    /// The external subtitle tool failed for a single video
    #[error("subtitle fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Webhooks are disabled or have no URL configured
    #[error("Webhooks are not enabled or no URL is configured.")]
    NotificationsDisabled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures of one external subtitle tool invocation
///
/// Reading the tool's output and the tool finishing unsuccessfully are
/// reported separately so the log says which one happened.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The tool binary could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The program that was executed
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// Reading stdout/stderr of the tool failed
    #[error("failed to read {stream} of subliminal: {source}")]
    Output {
        /// Which stream failed ("stdout" or "stderr")
        stream: &'static str,
        /// Underlying read error
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the tool to exit failed
    #[error("failed to wait for subliminal: {0}")]
    Wait(#[source] std::io::Error),

    /// The tool ran to completion but reported failure
    #[error("subliminal failed: {}", exit_description(*code))]
    Unsuccessful {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_in_progress",
///     "message": "A download task is already in progress."
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_in_progress", "scan_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::NotificationsDisabled => 400,

            // 409 Conflict - single-flight admission rejected
            Error::TaskInProgress => 409,

            // 422 Unprocessable Entity - the request was fine but the media tree is not
            Error::Scan { .. } => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
            Error::Fetch(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::TaskInProgress => "task_in_progress",
            Error::Scan { .. } => "scan_error",
            Error::Fetch(e) => match e {
                FetchError::Spawn { .. } => "fetch_spawn_failed",
                FetchError::Output { .. } => "fetch_output_failed",
                FetchError::Wait(_) => "fetch_wait_failed",
                FetchError::Unsuccessful { .. } => "fetch_unsuccessful",
            },
            Error::NotificationsDisabled => "notifications_disabled",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Scan { path, .. } => Some(serde_json::json!({ "path": path })),
            Error::Fetch(FetchError::Unsuccessful { code }) => {
                Some(serde_json::json!({ "exit_code": code }))
            }
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_in_progress_maps_to_conflict() {
        let error = Error::TaskInProgress;
        assert_eq!(error.status_code(), 409);
        assert_eq!(error.error_code(), "task_in_progress");
    }

    #[test]
    fn scan_error_carries_path_detail() {
        let error = Error::Scan {
            path: PathBuf::from("/media/missing"),
            reason: "not a directory".to_string(),
        };
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "scan_error");
        assert!(api_error.error.message.contains("/media/missing"));
        assert_eq!(api_error.error.details.unwrap()["path"], "/media/missing");
    }

    #[test]
    fn output_error_is_distinct_from_unsuccessful_exit() {
        let output = Error::Fetch(FetchError::Output {
            stream: "stdout",
            source: std::io::Error::other("broken pipe"),
        });
        let exit = Error::Fetch(FetchError::Unsuccessful { code: Some(1) });

        assert_ne!(output.error_code(), exit.error_code());
        assert!(exit.to_string().contains("exit status 1"));
        assert!(output.to_string().contains("stdout"));
    }

    #[test]
    fn unsuccessful_without_code_mentions_signal() {
        let error = FetchError::Unsuccessful { code: None };
        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn config_error_details_include_key() {
        let error = Error::Config {
            message: "interval must be positive".to_string(),
            key: Some("schedule_interval_minutes".to_string()),
        };
        assert_eq!(error.status_code(), 400);

        let api_error: ApiError = error.into();
        assert_eq!(
            api_error.error.details.unwrap()["key"],
            "schedule_interval_minutes"
        );
    }
}
