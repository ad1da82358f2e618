//! Authentication error types.

use thiserror::Error;

use storedesk_core::UserStatus;

use crate::db::RepositoryError;
use crate::services::tokens::TokenError;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; both produce this same error.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists but may not sign in.
    #[error("account is {0}")]
    AccountDisabled(UserStatus),

    /// Bearer or refresh token rejected.
    #[error("{0}")]
    Token(#[from] TokenError),

    /// Password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing failed")]
    PasswordHash,
}
