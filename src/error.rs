//! Error types for the waste sorter agent.
//!
//! Each stage of a cycle has its own error type. Only [`ConfigError`] is fatal;
//! everything else is contained at the cycle boundary, turned into the
//! review-needed indicator state and logged.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration problems.
///
/// These are reported before the cycle loop starts and terminate the process
/// with a non-zero status.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value was absent or empty.
    ///
    /// This covers both `IMAGE_PATH` and `IMAGE_PROCESSING_ENDPOINT`.
    #[error("Error: Image path or image-processing endpoint missing ({0} is empty)")]
    MissingValue(&'static str),

    /// The classification or telemetry endpoint is not a usable http(s) URL.
    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The GPIO pin list does not name exactly five lines.
    #[error("Invalid GPIO pin list: {0}")]
    InvalidPins(String),

    /// The capture command line could not be split into a program and arguments.
    #[error("Invalid capture command: {0}")]
    InvalidCaptureCommand(String),
}

/// Failure to produce a fresh frame at the image path.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The capture command could not be started.
    #[error("Failed to start capture command: {0}")]
    Spawn(#[source] std::io::Error),

    /// The capture command ran but reported failure.
    #[error("Capture command exited with {0}")]
    CommandFailed(ExitStatus),

    /// No file exists at the image path after capture.
    #[error("No frame found at {0}")]
    MissingFrame(PathBuf),

    /// The file at the image path was not rewritten by this cycle's capture.
    #[error("Frame at {0} was not refreshed by the capture command")]
    StaleFrame(PathBuf),
}

/// Errors surfaced by the classification client to its caller.
///
/// Transport and empty-result failures are reported as
/// [`ClassificationOutcome::Failed`](crate::types::ClassificationOutcome) values,
/// not through this type.
#[derive(Error, Debug)]
pub enum ClassificationError {
    /// The image at the configured path could not be read.
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP exchange failures with the classification endpoint.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or body read failure.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Server error {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// The body was not a prediction document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// HTTP status of the response, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            TransportError::Status { status_code, .. } => Some(*status_code),
            TransportError::Json(_) => None,
        }
    }
}

/// Telemetry delivery failures, reported through the confirmation path only.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Message timed out after {0:?}")]
    Timeout(Duration),

    #[error("Telemetry sink rejected message with {status_code}: {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Signing error: {0}")]
    Signature(String),
}
