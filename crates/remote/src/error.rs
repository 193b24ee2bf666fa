//! Error types for the remote APIs

use thiserror::Error;

/// Failure of a bot config API call.
///
/// Every client operation converts transport faults, bad statuses and
/// malformed bodies into one of these variants.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Server is not healthy (status: {0})")]
    Unhealthy(String),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of the video feed (video API or report file)
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Video API connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Video API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid video API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Report(#[from] persistence::ReportError),
}

pub type FeedResult<T> = Result<T, FeedError>;
