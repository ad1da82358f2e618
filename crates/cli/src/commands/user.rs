//! User management commands.
//!
//! ```bash
//! SD_USER_PASSWORD='...' sd-cli user create -e admin@example.com -u admin -n "Admin Name" -r admin
//! ```
//!
//! When `SD_USER_PASSWORD` is unset the password is read from the first line
//! of standard input.

use std::io::BufRead;

use storedesk_admin::db::UserRepository;
use storedesk_admin::db::users::NewUser;
use storedesk_admin::services::AuthError;
use storedesk_admin::services::auth::{hash_password, validate_password};
use storedesk_core::{Email, UserRole};
use thiserror::Error;

use super::{ConnectError, connect};

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_VAR: &str = "SD_USER_PASSWORD";

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid role: {0}. Valid roles: admin, vendor, customer")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid user name: must be 2-50 characters")]
    InvalidUserName,

    #[error("No password given: set {PASSWORD_VAR} or pipe it on stdin")]
    MissingPassword,

    #[error("Failed to read password: {0}")]
    Stdin(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(storedesk_admin::db::RepositoryError),
}

/// Arguments checked before anything touches the database.
#[derive(Debug)]
struct Checked {
    email: Email,
    user_name: String,
    full_name: String,
    role: UserRole,
}

fn check_args(email: &str, username: &str, name: &str, role: &str) -> Result<Checked, UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let user_name = username.trim();
    if !(2..=50).contains(&user_name.chars().count()) {
        return Err(UserError::InvalidUserName);
    }
    let full_name = match name.trim() {
        "" => user_name,
        trimmed => trimmed,
    };

    Ok(Checked {
        email,
        user_name: user_name.to_owned(),
        full_name: full_name.to_owned(),
        role,
    })
}

fn read_password() -> Result<String, UserError> {
    if let Ok(password) = std::env::var(PASSWORD_VAR) {
        return Ok(password);
    }

    tracing::info!("Enter password for the new user:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        return Err(UserError::MissingPassword);
    }
    Ok(password)
}

/// Create a user with a hashed password, returning its id.
pub async fn create(email: &str, username: &str, name: &str, role: &str) -> Result<i32, UserError> {
    let checked = check_args(email, username, name, role)?;

    let password = read_password()?;
    validate_password(&password)?;
    let password_hash = hash_password(&password)?;

    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", checked.email, checked.role);

    let user = UserRepository::new(&pool)
        .create(&NewUser {
            user_name: checked.user_name,
            full_name: checked.full_name,
            email: checked.email.clone(),
            password_hash,
            role: checked.role,
        })
        .await
        .map_err(|e| match e {
            storedesk_admin::db::RepositoryError::Conflict(_) => {
                UserError::UserExists(checked.email.to_string())
            }
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_args() {
        let checked = check_args("Mai@Example.org", " mai ", "", "vendor")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(checked.user_name, "mai");
        assert_eq!(checked.full_name, "mai");
        assert_eq!(checked.role, UserRole::Vendor);
    }

    #[test]
    fn test_check_args_rejects_bad_input() {
        assert!(matches!(
            check_args("mai@example.org", "mai", "Mai", "owner"),
            Err(UserError::InvalidRole(_))
        ));
        assert!(matches!(
            check_args("not-an-email", "mai", "Mai", "admin"),
            Err(UserError::InvalidEmail(_))
        ));
        assert!(matches!(
            check_args("mai@example.org", "m", "Mai", "admin"),
            Err(UserError::InvalidUserName)
        ));
    }
}
