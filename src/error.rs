use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Empty batch: scan at least one paper first")]
    EmptyBatch,

    #[error("Session is busy uploading; captures and removals are not accepted")]
    SessionBusy,

    #[error("Not signed in: no credential available for upload")]
    Unauthenticated,

    #[error("Cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Errors caused by what the user asked for, as opposed to system faults.
    /// These are shown verbatim and never change session state.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ScanError::EmptyBatch
                | ScanError::SessionBusy
                | ScanError::Unauthenticated
                | ScanError::InvalidState { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failure of a single image upload. Rendered into the outcome's error detail;
/// it never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    /// Non-2xx response. `detail` is the backend's own message when it sent one.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response from server: {0}")]
    MalformedResponse(String),

    #[error("Upload timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not read captured image: {0}")]
    LocalImage(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UploadError::MalformedResponse(err.to_string())
        } else {
            UploadError::Network(err.to_string())
        }
    }
}
