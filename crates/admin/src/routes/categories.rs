//! Category routes beyond plain CRUD.

use axum::extract::State;

use super::response::{ApiResponse, Listing};
use crate::db::categories;
use crate::error::Result;
use crate::models::category::Category;
use crate::state::AppState;

/// `GET /categories/root`: public list of active top-level categories.
pub async fn roots(State(state): State<AppState>) -> Result<ApiResponse<Listing<Category>>> {
    let roots = categories::roots(state.pool()).await?;
    Ok(ApiResponse::ok(Listing::all("categories", roots)))
}
