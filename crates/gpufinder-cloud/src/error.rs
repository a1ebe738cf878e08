//! Compute provider error types

use thiserror::Error;

/// Marker the compute service puts in the message of a quota rejection
pub const QUOTA_EXCEEDED_MESSAGE: &str = "Quota exceeded";

/// Machine-readable reason attached to quota rejections
pub const QUOTA_EXCEEDED_REASON: &str = "quotaExceeded";

/// Compute provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        reasons: Vec<String>,
    },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Build an HTTP error without structured reasons
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        CloudError::Http {
            status,
            message: message.into(),
            reasons: Vec::new(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 403 the service issued because a quota ran out.
    ///
    /// Matches either the human-readable marker in the message or the
    /// structured `quotaExceeded` reason.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            CloudError::Http {
                status: 403,
                message,
                reasons,
            } => {
                message.contains(QUOTA_EXCEEDED_MESSAGE)
                    || reasons.iter().any(|r| r == QUOTA_EXCEEDED_REASON)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
