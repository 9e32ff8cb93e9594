//! Session error types using thiserror 2.0.
//!
//! Every error is classified as retryable (transient network trouble) or
//! non-retryable (authoritative backend answers, contract violations).
//! The renewal loop and the facade both key their policy off this
//! classification.

use crate::session::SessionHealth;
use thiserror::Error;

/// Errors produced by the Vault session lifecycle.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Vault could not be reached (network-level, transient)
    #[error("connection to vault failed: {0}")]
    Connection(String),

    /// Vault rejected the supplied credentials (fatal at startup)
    #[error("vault rejected credentials: {0}")]
    AuthRejected(String),

    /// Vault returned a session descriptor missing required fields
    #[error("malformed auth response from vault: {0}")]
    MalformedResponse(String),

    /// Secret response did not contain the expected nested data envelope
    #[error("malformed secret returned from vault: {0}")]
    MalformedSecret(String),

    /// The session is known dead; the call was failed fast
    #[error("session unavailable: session is {0}")]
    SessionUnavailable(SessionHealth),

    /// Vault answered authoritatively that the lease is gone
    #[error("lease expired or revoked: {0}")]
    LeaseExpired(String),

    /// Invalid connection parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client error
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Check if the error is transient and worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Http(_))
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an auth rejected error.
    #[must_use]
    pub fn auth_rejected(msg: impl Into<String>) -> Self {
        Self::AuthRejected(msg.into())
    }

    /// Create a malformed response error.
    #[must_use]
    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a malformed secret error.
    #[must_use]
    pub fn malformed_secret(msg: impl Into<String>) -> Self {
        Self::MalformedSecret(msg.into())
    }

    /// Create a lease expired error.
    #[must_use]
    pub fn lease_expired(msg: impl Into<String>) -> Self {
        Self::LeaseExpired(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::connection("connection refused");
        assert_eq!(err.to_string(), "connection to vault failed: connection refused");

        let err = SessionError::SessionUnavailable(SessionHealth::Expired);
        assert_eq!(err.to_string(), "session unavailable: session is expired");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(SessionError::connection("timeout").is_retryable());
        assert!(!SessionError::auth_rejected("bad password").is_retryable());
        assert!(!SessionError::lease_expired("lease not found").is_retryable());
        assert!(!SessionError::malformed_secret("missing data").is_retryable());
        assert!(!SessionError::SessionUnavailable(SessionHealth::Canceled).is_retryable());
    }
}
