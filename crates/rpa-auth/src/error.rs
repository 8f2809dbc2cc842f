//! Session error types.

use crate::TokenRejection;
use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token failed the surface's claim check and was discarded
    #[error("Token rejected: {0}")]
    TokenRejected(#[from] TokenRejection),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] rpa_storage::StorageError),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejection_converts() {
        let err: AuthError = TokenRejection::ForeignType("user_access".to_string()).into();
        assert!(matches!(err, AuthError::TokenRejected(_)));
        assert!(err.to_string().contains("user_access"));
    }
}
