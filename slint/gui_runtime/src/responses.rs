use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::handle::{Handle, NO_HANDLE};
use crate::model::Configuration;

/// Reply to one request. Failures keep the shape of the success reply and
/// carry an [`ErrorCode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    Ack {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    Created {
        id: Handle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    NewActivity {
        aid: Handle,
        tid: Handle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    Configuration {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        configuration: Option<Configuration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    Dimensions {
        width: i32,
        height: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    ScrollPosition {
        x: i32,
        y: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
    Locked {
        locked: bool,
    },
    Version {
        version_code: i32,
    },
    Log {
        log: String,
    },
}

impl Response {
    pub fn ok() -> Self {
        Self::Ack {
            success: true,
            code: None,
        }
    }

    pub fn failed(code: ErrorCode) -> Self {
        Self::Ack {
            success: false,
            code: Some(code),
        }
    }

    pub fn created(id: Handle) -> Self {
        Self::Created { id, code: None }
    }

    pub fn not_created(code: ErrorCode) -> Self {
        Self::Created {
            id: NO_HANDLE,
            code: Some(code),
        }
    }

    /// Whether the response reports success.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Ack { success, .. } => *success,
            Self::Created { code, .. }
            | Self::NewActivity { code, .. }
            | Self::Configuration { code, .. }
            | Self::Dimensions { code, .. }
            | Self::Text { code, .. }
            | Self::ScrollPosition { code, .. } => code.is_none(),
            Self::Locked { .. } | Self::Version { .. } | Self::Log { .. } => true,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ack { code, .. }
            | Self::Created { code, .. }
            | Self::NewActivity { code, .. }
            | Self::Configuration { code, .. }
            | Self::Dimensions { code, .. }
            | Self::Text { code, .. }
            | Self::ScrollPosition { code, .. } => *code,
            Self::Locked { .. } | Self::Version { .. } | Self::Log { .. } => None,
        }
    }
}
