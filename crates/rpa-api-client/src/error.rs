//! Error types for backend calls.

use rpa_auth::{AuthError, TokenRejection};
use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`ApiClient`](crate::ApiClient) and the API wrappers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure or timeout. Never retried.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        /// The `detail` field of the error body, when present.
        detail: Option<String>,
        body: String,
    },

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL and path do not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A login response carried no access token
    #[error("Login response did not include an access token")]
    MissingToken,

    /// A login response carried a token this surface does not accept
    #[error("Token rejected: {0}")]
    TokenRejected(#[from] TokenRejection),

    /// Caller-supplied input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session update failed
    #[error("Session error: {0}")]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// Build a [`ApiError::Status`] from a response status and raw body.
    pub fn from_status(status: u16, body: String) -> Self {
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| match value.get("detail") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.is_empty() => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            });
        ApiError::Status {
            status,
            detail,
            body,
        }
    }

    /// HTTP status of a [`ApiError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text to show a person: the backend's `detail` when it sent one,
    /// otherwise this error's message, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ApiError::Status {
            detail: Some(detail),
            ..
        } = self
        {
            return detail.clone();
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
