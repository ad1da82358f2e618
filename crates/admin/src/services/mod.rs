//! Business logic services for the API.
//!
//! # Services
//!
//! - `activity` - Activity-log recording for mutations and logins
//! - `auth` - Password login, token refresh and bearer authentication
//! - `tokens` - HMAC-signed access and refresh tokens
//! - `uploads` - Image uploads stored on local disk

pub mod activity;
pub mod auth;
pub mod tokens;
pub mod uploads;

pub use activity::ClientInfo;
pub use auth::{AuthError, AuthService, LoginResult};
pub use tokens::{TokenError, TokenKind, TokenPair, TokenSigner};
pub use uploads::{UploadError, UploadStore, UploadedFile};
