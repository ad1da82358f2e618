//! Back-office users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{UserId, UserRole, UserStatus};

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

/// Password length bounds, in characters.
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 255;

/// A user account. The password hash is never part of this struct.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    #[serde(rename = "roles")]
    pub role: UserRole,
    pub status: UserStatus,
    pub avatar_url: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Body of `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "roles")]
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub avatar_url: Option<String>,
}

impl Validate for UserPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("userName", self.user_name.as_deref(), 2, 50);
        v.required_text("fullName", self.full_name.as_deref(), 2, 100);
        v.required("email", self.email.as_ref());
        v.email("email", self.email.as_deref());
        v.required("password", self.password.as_ref());
        if let Some(password) = &self.password {
            let len = password.chars().count();
            v.check(
                (PASSWORD_MIN..=PASSWORD_MAX).contains(&len),
                "password",
                format!("password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"),
            );
        }
        v.url("avatarUrl", self.avatar_url.as_deref(), 255);
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_credentials() {
        let payload = UserPayload {
            user_name: Some("mai".into()),
            full_name: Some("Mai Tran".into()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Create).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password"]);
        assert!(payload.validate(Mode::Update).is_ok());
    }

    #[test]
    fn test_password_length() {
        let payload = UserPayload {
            password: Some("12345".into()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Update).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "password must be between 6 and 255 characters"
        );
    }

    #[test]
    fn test_payload_accepts_roles_key() {
        let payload: UserPayload = serde_json::from_value(serde_json::json!({
            "userName": "nam",
            "roles": "vendor",
            "status": "banned"
        }))
        .unwrap();
        assert_eq!(payload.role, Some(UserRole::Vendor));
        assert_eq!(payload.status, Some(UserStatus::Banned));
    }

    #[test]
    fn test_rejects_bad_email() {
        let payload = UserPayload {
            email: Some("mai@".into()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Update).unwrap_err();
        assert_eq!(errors.errors[0].message, "email must be a valid email");
    }
}
