//! Error types for session state.
//!
//! Messages never include cookie values or token text.

use thiserror::Error;

/// A `Set-Cookie` header that could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    /// No `name=value` pair, or an empty name.
    #[error("malformed Set-Cookie header")]
    Malformed,

    /// The `Domain` attribute does not cover the responding host.
    #[error("cookie domain {domain} does not match host {host}")]
    DomainMismatch { domain: String, host: String },

    /// The response URL has no host to scope the cookie to.
    #[error("response URL has no host")]
    NoHost,
}

/// Rejection of a once-token before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong length or characters outside `[A-Za-z0-9]`.
    #[error("once token has an invalid shape ({length} characters)")]
    InvalidShape { length: usize },

    /// The token was already spent by this session.
    #[error("once token was already used")]
    AlreadyUsed,
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Cookie parsing failed.
    #[error("cookie error: {0}")]
    Cookie(#[from] CookieError),

    /// Once-token rejected.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Persistence key contains characters unsafe for a file name.
    #[error("invalid persistence key: {0}")]
    InvalidKey(String),

    /// Serialization/deserialization of the cookie blob failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing persisted state failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Locating the data directory failed.
    #[error(transparent)]
    Config(#[from] agora_core::ConfigError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<SessionError> for agora_core::AgoraError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Token(token) => Self::Token(token.to_string()),
            SessionError::Io(io) => Self::Io(io),
            SessionError::Config(config) => Self::Config(config),
            other => Self::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_hide_token() {
        let err = TokenError::InvalidShape { length: 4 };
        assert_eq!(err.to_string(), "once token has an invalid shape (4 characters)");
        assert_eq!(
            SessionError::from(TokenError::AlreadyUsed).to_string(),
            "once token was already used"
        );
    }

    #[test]
    fn test_into_core_error() {
        let core: agora_core::AgoraError = SessionError::from(TokenError::AlreadyUsed).into();
        assert!(matches!(core, agora_core::AgoraError::Token(_)));

        let core: agora_core::AgoraError = SessionError::InvalidKey("../x".to_string()).into();
        assert!(matches!(core, agora_core::AgoraError::Session(_)));
    }
}
