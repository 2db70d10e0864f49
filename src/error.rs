use reqwest::StatusCode;
use std::time::Duration;

use crate::jobs::JobStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by [`crate::Client`].
///
/// Every failure maps to exactly one variant and is returned immediately;
/// the client never retries and never swallows a non-success response.
/// Variants backed by an HTTP response carry the status code and the raw
/// response body for diagnostics (see [`Error::status`] and
/// [`Error::body`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed client configuration (credentials, hub, ids).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Locally rejected input data (empty frame, ragged columns, empty CSV).
    #[error("invalid input data: {0}")]
    InvalidData(String),

    /// Failed to read an import input from disk or a caller-supplied reader.
    #[error("failed to read import input from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The import endpoint rejected an upload.
    #[error("upload failed: HTTP {status}: {}", server_message(.body))]
    Upload { status: StatusCode, body: String },

    /// A page request failed during export; no partial data is returned.
    #[error("export failed: HTTP {status}: {}", server_message(.body))]
    Export { status: StatusCode, body: String },

    /// A read-only query (hierarchy, job status) failed.
    #[error("query failed: HTTP {status}: {}", server_message(.body))]
    Query { status: StatusCode, body: String },

    /// Job creation was rejected.
    #[error("job creation failed: HTTP {status}: {}", server_message(.body))]
    JobCreation { status: StatusCode, body: String },

    /// Job submission was rejected (commonly: not in a submittable state).
    #[error("failed to submit job {job_id}: HTTP {status}: {}", server_message(.body))]
    JobSubmission {
        job_id: String,
        status: StatusCode,
        body: String,
    },

    /// The server does not know the job id.
    #[error("job {job_id} not found")]
    JobNotFound { job_id: String, body: String },

    /// Cancellation was rejected (commonly: job already terminal).
    #[error("failed to cancel job {job_id}: HTTP {status}: {}", server_message(.body))]
    JobCancellation {
        job_id: String,
        status: StatusCode,
        body: String,
    },

    /// The job did not reach a terminal status within the polling window.
    /// The job keeps running server-side; the client only stops observing.
    #[error(
        "job {job_id} did not reach a terminal status within {}s (last status: {last_status})",
        .timeout.as_secs()
    )]
    JobTimeout {
        job_id: String,
        timeout: Duration,
        last_status: JobStatus,
    },

    /// The request failed at the transport level (connection, TLS,
    /// timeout, interrupted body read).
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response body could not be parsed as the expected JSON shape.
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Upload { status, .. }
            | Error::Export { status, .. }
            | Error::Query { status, .. }
            | Error::JobCreation { status, .. }
            | Error::JobSubmission { status, .. }
            | Error::JobCancellation { status, .. } => Some(*status),
            Error::JobNotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Raw response body of the failed request, when one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Upload { body, .. }
            | Error::Export { body, .. }
            | Error::Query { body, .. }
            | Error::JobCreation { body, .. }
            | Error::JobSubmission { body, .. }
            | Error::JobNotFound { body, .. }
            | Error::JobCancellation { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Pulls a human-readable message out of a Vena error payload.
///
/// The API answers failures with JSON along the lines of
/// `{"message": "..."}` or `{"error": "..."}`; anything unparseable is
/// shown as-is.
pub(crate) fn server_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed
            .message
            .or(parsed.error)
            .or(parsed.detail)
            .filter(|m| !m.trim().is_empty())
        {
            return msg;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response body)".to_string()
    } else {
        trimmed.to_string()
    }
}
