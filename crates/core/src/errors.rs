//! Error types shared across the Notewell crates.

use thiserror::Error;

/// Result type alias for store-backed operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the remote document store or
/// validating input ahead of it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No response was received at all (request never reached the server,
    /// timed out, or the reachability probe failed).
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The server answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Missing or expired credential. Never retried; forces sign-out.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Local pre-network validation failure. Carries every violated rule.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// A create or rename would collide with an existing name for the
    /// same owner.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// Anything not classified above.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl StoreError {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    /// Create an auth error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Only connectivity failures are eligible for automatic retry; a
    /// received error response is never retried.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// True when the failure should end the session.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connectivity_is_retryable() {
        assert!(StoreError::connectivity("timed out").is_connectivity());
        assert!(!StoreError::api(500, "boom").is_connectivity());
        assert!(!StoreError::auth("expired").is_connectivity());
        assert!(!StoreError::Validation(vec!["empty".into()]).is_connectivity());
    }

    #[test]
    fn validation_message_lists_every_rule() {
        let err = StoreError::Validation(vec!["name empty".into(), "bad amount".into()]);
        assert_eq!(err.to_string(), "validation failed: name empty, bad amount");
    }
}
