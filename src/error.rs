use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bridge transport error on {target}: {reason}")]
    Transport { target: String, reason: String },

    #[error("permission denied for {target}: {reason}")]
    PermissionDenied { target: String, reason: String },

    #[error("connection to endpoint \"{url}\" could not be established: {reason}")]
    Connection { url: String, reason: String },

    #[error("invalid address \"{address}\": {reason}")]
    AddressParse { address: String, reason: String },

    #[error("host operation {target} failed: {reason}")]
    HostOperation { target: String, reason: String },

    #[error("conflict on {target}: {reason}")]
    Conflict { target: String, reason: String },

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("invalid response from {target}: {reason}")]
    InvalidResponse { target: String, reason: String },

    #[error("request to {target} timed out after {after:?}")]
    Timeout { target: String, after: Duration },

    #[error("request to {target} was cancelled")]
    Cancelled { target: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

impl Error {
    pub(crate) fn transport(target: impl ToString, reason: impl ToString) -> Self {
        Self::Transport {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_response(target: impl ToString, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the host rejected a write because the primary key is taken.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
