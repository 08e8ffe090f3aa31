use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, reset, bad body...)
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered, but not with a success status
    #[error("backend error {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Bad credentials or duplicate signup. The message is shown to the user as-is.
    #[error("{0}")]
    AuthFailure(String),

    /// The configured backend URL cannot take path segments
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Both transport failures and non-success responses count as network failures.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Status { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}
