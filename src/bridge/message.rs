use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{OperationKind, Target};

/// A single bridge call as it crosses the extension/host boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub extension_identifier: String,
    pub operation_kind: OperationKind,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Why the host refused or failed a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The (kind, target) pair was not granted at install time.
    PermissionDenied,
    /// The host has no handler for the target.
    UnknownTarget,
    /// The payload did not match the target's contract.
    BadRequest,
    /// A write collided with an existing primary key.
    Conflict,
    /// The target's handler failed.
    OperationFailed,
    /// A code this crate does not know, sent by a newer host.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Host reply. When `error` is set, `response` carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

impl BridgeResponse {
    #[must_use]
    pub fn ok(response: Value) -> Self {
        Self {
            response,
            error: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::ok(Value::Null)
    }

    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            response: Value::Null,
            error: Some(ErrorDescriptor::new(code, message)),
        }
    }

    /// Splits the reply into the success value or the matching error.
    pub fn into_result(self, target: Target) -> Result<Value> {
        let Some(error) = self.error else {
            return Ok(self.response);
        };

        let target_name = target.to_string();
        Err(match error.code {
            ErrorCode::PermissionDenied => Error::PermissionDenied {
                target: target_name,
                reason: error.message,
            },
            ErrorCode::UnknownTarget => Error::UnknownTarget(target_name),
            ErrorCode::Conflict => Error::Conflict {
                target: target_name,
                reason: error.message,
            },
            ErrorCode::BadRequest | ErrorCode::OperationFailed | ErrorCode::Unknown => {
                Error::HostOperation {
                    target: target_name,
                    reason: error.message,
                }
            }
        })
    }
}

impl From<ErrorDescriptor> for BridgeResponse {
    fn from(error: ErrorDescriptor) -> Self {
        Self {
            response: Value::Null,
            error: Some(error),
        }
    }
}
