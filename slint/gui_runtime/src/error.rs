//! Error types shared by the session engine.
//!
//! Only [`ProtocolError`] ends a session. Everything else is reported to the
//! client as a negative response carrying an [`ErrorCode`].

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::Handle;
use crate::model::ViewKind;
use crate::registry::ResourceKind;

/// Framing, decoding or transport failure. Always session-fatal.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Registry lookups and handle allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{kind} {handle} not found")]
    NotFound { kind: ResourceKind, handle: Handle },

    #[error("handle space exhausted")]
    Exhausted,
}

/// Failure reported by the platform while performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unsupported by platform: {0}")]
    Unsupported(String),

    #[error("platform resource is gone: {0}")]
    Gone(String),

    #[error("platform failure: {0}")]
    Failed(String),
}

/// An operation-recoverable failure of a single request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("view {id} is a {kind:?}, operation requires {expected}")]
    InvalidViewType {
        id: Handle,
        kind: ViewKind,
        expected: &'static str,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

impl HandlerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Registry(RegistryError::NotFound {
                kind: ResourceKind::Activity | ResourceKind::Overlay,
                ..
            }) => ErrorCode::ActivityDestroyed,
            Self::Registry(RegistryError::NotFound { .. }) => ErrorCode::NotFound,
            Self::Registry(RegistryError::Exhausted) => ErrorCode::HandleExhausted,
            Self::Platform(PlatformError::PermissionDenied(_)) => ErrorCode::PermissionDenied,
            Self::Platform(PlatformError::Unsupported(_)) | Self::Unsupported(_) => {
                ErrorCode::Unsupported
            }
            Self::Platform(PlatformError::Gone(_)) => ErrorCode::ActivityDestroyed,
            Self::Platform(PlatformError::Failed(_)) => ErrorCode::InternalError,
            Self::InvalidViewType { .. } => ErrorCode::InvalidViewType,
            Self::InvalidParameter(_) => ErrorCode::InvalidParameter,
        }
    }
}

/// Failure indicator carried by negative responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ActivityDestroyed,
    InvalidViewType,
    InvalidParameter,
    PermissionDenied,
    HandleExhausted,
    Unsupported,
    InternalError,
}
