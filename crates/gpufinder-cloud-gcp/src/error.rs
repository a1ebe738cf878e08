//! Compute Engine client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("gcloud not found. Please install the Google Cloud SDK or set GOOGLE_OAUTH_ACCESS_TOKEN")]
    GcloudNotFound,

    #[error("gcloud authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("gcloud command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GcpError>;
