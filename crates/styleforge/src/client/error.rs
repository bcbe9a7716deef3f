//! Operation client error types.
//!
//! Every rejection carries the raw response body so the calling layer can
//! surface the service's diagnostics unchanged.

use thiserror::Error;

use super::{OperationKind, StageKind};

/// Maximum number of characters of a response body echoed into log lines.
const MAX_LOGGED_BODY_LENGTH: usize = 200;

/// Truncates a response body for logging; the full body stays on the error.
/// Counted in characters, not bytes, so multi-byte bodies never split.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_LOGGED_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOGGED_BODY_LENGTH).collect();
        format!("{head}... (truncated)")
    } else {
        body.to_string()
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The service did not accept a stage start (anything but HTTP 202).
    #[error("{stage} operation was not accepted ({status}): {body}")]
    StartRejected {
        stage: StageKind,
        status: u16,
        body: String,
    },

    #[error("{stage} start was accepted but carried no operation-location header")]
    MissingOperationLocation { stage: StageKind },

    /// A status poll came back with anything but HTTP 200.
    #[error("Polling {kind} operation '{operation_id}' failed ({status}): {body}")]
    PollRejected {
        kind: OperationKind,
        operation_id: String,
        status: u16,
        body: String,
    },

    /// The service reported the operation itself as Failed.
    #[error("{kind} operation '{operation_id}' failed on the service side")]
    OperationFailed {
        kind: OperationKind,
        operation_id: String,
    },

    #[error("{kind} operation '{operation_id}' did not finish within {attempts} polls")]
    PollTimeout {
        kind: OperationKind,
        operation_id: String,
        attempts: u32,
    },

    #[error("{kind} operation '{operation_id}' succeeded without a resource-location header")]
    MissingResourceLocation {
        kind: OperationKind,
        operation_id: String,
    },

    /// Non-202 on an artifact create.
    #[error("Artifact upload rejected ({status}): {body}")]
    UploadRejected { status: u16, body: String },

    /// Non-2xx on a plain artifact GET/DELETE.
    #[error("Request to '{path}' failed ({status}): {body}")]
    RequestRejected {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{stage} stage was given the wrong input kind")]
    InvalidStageInput { stage: StageKind },
}

impl ClientError {
    /// The response body attached to this error, when one exists.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::StartRejected { body, .. }
            | ClientError::PollRejected { body, .. }
            | ClientError::UploadRejected { body, .. }
            | ClientError::RequestRejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
