//! Error types for the write path.

use agora_session::TokenError;
use thiserror::Error;

/// Why a mutation could not be prepared. No request exists in any case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The once-token was malformed or already spent.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The source page carried no once-token (usually: not signed in).
    #[error("page has no once token; sign in and reload it")]
    MissingOnce,

    /// The target URL could not be built from the base URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type for write-path operations.
pub type Result<T> = std::result::Result<T, ActionError>;
