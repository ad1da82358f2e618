//! Authentication routes.
//!
//! ```text
//! POST /auth/login          - Email/password login (rate limited)
//! POST /auth/refresh-token  - Exchange a refresh token for a new pair
//! GET  /auth/profile        - The authenticated user
//! ```

use axum::{Router, extract::State, routing::{get, post}};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use storedesk_core::ActivityAction;

use super::response::{ApiResponse, JsonBody};
use crate::db::resource;
use crate::db::users::Users;
use crate::error::Result;
use crate::middleware::{RequireAuth, login_rate_limiter};
use crate::models::User;
use crate::services::{AuthService, ClientInfo, LoginResult, TokenPair, activity};
use crate::state::AppState;
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login).layer(login_rate_limiter()))
        .route("/refresh-token", post(refresh_token))
        .route("/profile", get(profile))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self, mode: Mode) -> std::result::Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("email", self.email.as_deref(), 1, 100);
        v.required_text("password", self.password.as_deref(), 1, 255);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Tokens {
    pub tokens: TokenPair,
}

#[tracing::instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<ApiResponse<LoginResult>> {
    body.validate(Mode::Create)?;
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let result = AuthService::new(state.pool(), state.tokens())
        .login(&email, &password, Utc::now())
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login rejected"))?;

    tracing::info!(user_id = %result.user.id, "User logged in");
    activity::record(
        state.pool(),
        client.entry(
            Some(result.user.id),
            ActivityAction::Login,
            "user",
            Some(result.user.id.as_i32()),
        ),
    )
    .await;

    Ok(ApiResponse::ok(result))
}

async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RefreshRequest>,
) -> Result<ApiResponse<Tokens>> {
    let token = body
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ValidationErrors::single("refreshToken", "refreshToken is required"))?;

    let tokens = AuthService::new(state.pool(), state.tokens())
        .refresh(token.trim(), Utc::now())
        .await?;
    Ok(ApiResponse::ok(Tokens { tokens }))
}

async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<User>> {
    let user = resource::get::<Users>(state.pool(), user.id).await?;
    Ok(ApiResponse::ok(user))
}
