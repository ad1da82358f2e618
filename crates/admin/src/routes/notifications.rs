//! Notification read-state routes.
//!
//! ```text
//! PUT /notifications/{id}/read      - Mark one notification read
//! PUT /notifications/read-all?user= - Mark all of a user's notifications read
//! ```

use std::collections::HashMap;

use axum::extract::{Path, Query, State};

use storedesk_core::{NotificationId, UserId};

use super::response::{ApiResponse, parse_id};
use crate::db::notifications::{self, Notifications};
use crate::db::resource;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::notification::{MarkedRead, Notification};
use crate::state::AppState;

pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<ApiResponse<Notification>> {
    let id: NotificationId = parse_id(&id)?;
    let notification = resource::get::<Notifications>(state.pool(), id).await?;

    let owner = notification.user.as_ref().map(|u| u.0.id);
    if owner != Some(user.id) && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Cannot change another user's notifications".to_string(),
        ));
    }

    notifications::mark_read(state.pool(), id).await?;
    let notification = resource::get::<Notifications>(state.pool(), id).await?;
    Ok(ApiResponse::ok(notification))
}

/// Admins may name any user; everyone else marks their own.
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<MarkedRead>> {
    let target = match params.get("user").map(String::as_str).filter(|v| !v.is_empty()) {
        Some(raw) => parse_id::<UserId>(raw)?,
        None => user.id,
    };
    if target != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Cannot change another user's notifications".to_string(),
        ));
    }

    let modified_count = notifications::mark_all_read(state.pool(), target).await?;
    tracing::info!(user_id = %target, modified_count, "Notifications marked read");
    Ok(ApiResponse::ok(MarkedRead { modified_count }))
}
