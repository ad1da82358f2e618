//! Authentication service.
//!
//! Email/password login with argon2id hashes, and stateless bearer tokens
//! for every request after that.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use storedesk_core::{Email, UserStatus};

use crate::db::users::UserRepository;
use crate::models::user::{PASSWORD_MAX, PASSWORD_MIN, User};
use crate::models::CurrentUser;
use crate::services::tokens::{TokenKind, TokenPair, TokenSigner};

/// Result of a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Authentication service.
///
/// Handles login, token refresh and bearer-token authentication.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenSigner) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDisabled` if the account is not active.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginResult, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        let mut user = credentials.user;
        ensure_active(&user)?;

        self.users.touch_last_login(user.id).await?;
        user.last_login = Some(now);

        let tokens = self.tokens.issue_pair(user.id, user.role, now)?;
        Ok(LoginResult { user, tokens })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The role is re-read from the database, so role changes take effect on
    /// the next refresh.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the refresh token is invalid or expired.
    /// Returns `AuthError::AccountDisabled` if the account was deactivated.
    pub async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh, now)?;
        let user = self
            .users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        ensure_active(&user)?;

        Ok(self.tokens.issue_pair(user.id, user.role, now)?)
    }

    /// Resolve a bearer access token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is invalid or expired.
    /// Returns `AuthError::InvalidCredentials` if the user no longer exists.
    /// Returns `AuthError::AccountDisabled` if the account is not active.
    pub async fn authenticate(&self, access_token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access, now)?;
        let user = self
            .users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        ensure_active(&user)?;
        Ok(user)
    }

    /// Like [`Self::authenticate`], returning only what handlers need.
    ///
    /// # Errors
    ///
    /// See [`Self::authenticate`].
    pub async fn current_user(&self, access_token: &str, now: DateTime<Utc>) -> Result<CurrentUser, AuthError> {
        let user = self.authenticate(access_token, now).await?;
        Ok(CurrentUser::from(&user))
    }
}

fn ensure_active(user: &User) -> Result<(), AuthError> {
    match user.status {
        UserStatus::Active => Ok(()),
        status => Err(AuthError::AccountDisabled(status)),
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short or too long.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(AuthError::WeakPassword(format!(
            "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(matches!(
            validate_password("abc"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password(&"x".repeat(256)).is_err());
    }
}
