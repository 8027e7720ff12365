//! Authentication and session lifecycle logic.
//!
//! Provides password hashing, the token codec, and the identity resolver
//! shared by the HTTP layer.

pub mod password;
pub mod queries;
pub mod resolver;
pub mod token;

use thiserror::Error;

/// Authentication errors.
///
/// The first four kinds are recoverable auth outcomes with stable wire codes;
/// the rest are infrastructure faults and must never be surfaced as one of
/// the auth kinds.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("data integrity fault: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<token::TokenError> for AuthError {
    fn from(_: token::TokenError) -> Self {
        AuthError::InvalidToken
    }
}
