//! Error taxonomy for every operation in this crate.
//!
//! Remote rejections keep the payload YouTube sent back, so callers can always
//! match on the original `code`, `reason` and `status` rather than on a
//! flattened message.

use crate::resolve::ResourceFamily;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to the YouTube Data API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Acquiring or refreshing OAuth credentials failed.
    ///
    /// Not retried. The usual remedy is to delete the token file and run the
    /// interactive authorization flow again.
    #[error("authentication failed (re-run the interactive authorization flow)")]
    Authentication(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// The API rejected a well-formed request (permission, quota, validation, not found).
    #[error("YouTube API rejected {method} {url}: {error}")]
    Request {
        method: Method,
        url: String,
        error: RemoteError,
    },

    /// Network failure, server-side failure, or a body we could not decode.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A local lookup found no matching resource. No remote error occurred.
    #[error("no {family} named {name:?}")]
    NotFound { family: ResourceFamily, name: String },

    /// A required parameter was empty, or a list parameter repeated an entry.
    #[error("parameter `{name}` is empty or repeats an entry")]
    InvalidArgument { name: &'static str },

    /// Reading or writing a local file (media uploads, caption downloads) failed.
    #[error("local file I/O failed")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn authentication(report: eyre::Report) -> Self {
        Self::Authentication(report.into())
    }

    /// The remote error payload, if the API rejected the request.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Request { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Failures below the API's request/response semantics.
///
/// These may be transient. Whether to retry is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP transport failed")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("resumable upload response carried no Location header")]
    MissingUploadLocation,
}

/// The `error` object of a YouTube API error response.
///
/// ```json
/// { "error": { "code": 403, "message": "...", "errors": [{ "message": "...",
///   "domain": "global", "reason": "insufficientPermissions" }], "status": "PERMISSION_DENIED" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// HTTP status code as reported by the API.
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<RemoteErrorDetail>,
    /// Canonical status string, e.g. `PERMISSION_DENIED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One entry of [`RemoteError::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
struct RemoteErrorEnvelope {
    error: RemoteError,
}

impl RemoteError {
    /// The `reason` of the first error detail, e.g. `quotaExceeded`.
    pub fn reason(&self) -> Option<&str> {
        self.errors.first().map(|e| e.reason.as_str())
    }

    /// Parses an error body, falling back to the raw text when it is not the
    /// standard envelope.
    pub(crate) fn from_body(code: u16, body: &str) -> Self {
        match serde_json::from_str::<RemoteErrorEnvelope>(body) {
            Ok(envelope) => envelope.error,
            Err(_) => Self {
                code,
                message: body.to_string(),
                errors: Vec::new(),
                status: None,
            },
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)?;
        if let Some(reason) = self.reason() {
            write!(f, " (reason: {reason})")?;
        }
        if let Some(status) = &self.status {
            write!(f, " [{status}]")?;
        }
        Ok(())
    }
}

/// Fails with [`Error::InvalidArgument`] if `value` is empty or only whitespace.
pub(crate) fn require<'a>(name: &'static str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(Error::InvalidArgument { name })
    } else {
        Ok(value)
    }
}
