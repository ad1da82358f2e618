//! `POST /coupons/validate`: price a coupon against a subtotal without using it.

use axum::extract::State;
use rust_decimal::Decimal;

use storedesk_core::MAX_MONEY;

use super::response::{ApiResponse, JsonBody};
use crate::db::{RepositoryError, coupons};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::coupon::{CouponCheck, CouponQuote};
use crate::state::AppState;
use crate::validation::ValidationErrors;

pub async fn validate(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    JsonBody(check): JsonBody<CouponCheck>,
) -> Result<ApiResponse<CouponQuote>> {
    if check.code.trim().is_empty() {
        return Err(ValidationErrors::single("code", "code is required").into());
    }
    if check.subtotal < Decimal::ZERO {
        return Err(ValidationErrors::single("subtotal", "subtotal must not be negative").into());
    }
    if check.subtotal > MAX_MONEY {
        return Err(ValidationErrors::single(
            "subtotal",
            format!("subtotal must be at most {MAX_MONEY}"),
        )
        .into());
    }

    let mut conn = state.pool().acquire().await.map_err(RepositoryError::from)?;
    let (coupon, discount) = coupons::quote(&mut conn, &check.code, check.subtotal, false).await?;

    Ok(ApiResponse::ok(CouponQuote {
        coupon,
        discount,
        total: check.subtotal - discount,
    }))
}
