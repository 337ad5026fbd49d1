//! Client-side error model.

use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Failure of an outbound call or of the session machinery around it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    /// A success response whose body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// An authorized call was attempted without a session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The session could not be renewed and has been closed.
    #[error("session expired")]
    SessionExpired,
}

impl ClientError {
    /// Whether the API rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }

    /// The server-provided `detail` message, if the API sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Only the server's own `detail` text is surfaced; everything else
    /// (transport errors, decode failures) collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Failure of the persistent token store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("token store lock poisoned")]
    Poisoned,
}
