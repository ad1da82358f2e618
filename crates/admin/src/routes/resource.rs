//! Generic CRUD routes, instantiated once per entity.
//!
//! ```text
//! GET    /            - Paginated list (any authenticated user)
//! POST   /            - Create (admin)
//! GET    /{id}        - Fetch one (any authenticated user)
//! PUT    /{id}        - Partial update (admin)
//! DELETE /{id}        - Delete, returning the deleted record (admin)
//! ```

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};

use storedesk_core::ActivityAction;

use super::response::{ApiResponse, JsonBody, Listing, parse_id};
use crate::db::resource::{self, ListQuery, Resource, Writable};
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::services::{ClientInfo, activity};
use crate::state::AppState;
use crate::validation::{Mode, Validate};

/// Full CRUD router for a writable entity.
pub fn router<R: Writable>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/{id}", get(show::<R>).put(update::<R>).delete(remove::<R>))
}

/// List and fetch only.
pub fn read_only_router<R: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>))
        .route("/{id}", get(show::<R>))
}

async fn list<R: Resource>(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Listing<R::Record>>> {
    let query = ListQuery::parse::<R>(&params)?;
    let page = resource::fetch_page::<R>(state.pool(), &query).await?;
    Ok(ApiResponse::ok(Listing::new(R::COLLECTION, page)))
}

async fn show<R: Resource>(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<String>,
) -> Result<ApiResponse<R::Record>> {
    let id: R::Id = parse_id(&id)?;
    let record = resource::get::<R>(state.pool(), id).await?;
    Ok(ApiResponse::ok(record))
}

#[tracing::instrument(skip_all, fields(entity = R::NAME))]
async fn create<R: Writable>(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    client: ClientInfo,
    JsonBody(payload): JsonBody<R::Payload>,
) -> Result<ApiResponse<R::Record>> {
    payload.validate(Mode::Create)?;
    for key in R::unique_keys(&payload) {
        resource::ensure_unique(state.pool(), R::TABLE, &key, None).await?;
    }

    let id = R::insert(state.pool(), payload).await?;
    let record = resource::get::<R>(state.pool(), id).await?;

    tracing::info!(id = %id, user_id = %user.id, "Record created");
    activity::record(
        state.pool(),
        client.entry(Some(user.id), ActivityAction::Create, R::NAME, Some(id.into())),
    )
    .await;

    Ok(ApiResponse::created(record))
}

#[tracing::instrument(skip_all, fields(entity = R::NAME))]
async fn update<R: Writable>(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<R::Payload>,
) -> Result<ApiResponse<R::Record>> {
    let id: R::Id = parse_id(&id)?;
    payload.validate(Mode::Update)?;

    resource::ensure_exists(state.pool(), R::TABLE, id.into()).await?;
    for key in R::unique_keys(&payload) {
        resource::ensure_unique(state.pool(), R::TABLE, &key, Some(id.into())).await?;
    }

    R::update(state.pool(), id, payload).await?;
    let record = resource::get::<R>(state.pool(), id).await?;

    tracing::info!(id = %id, user_id = %user.id, "Record updated");
    activity::record(
        state.pool(),
        client.entry(Some(user.id), ActivityAction::Update, R::NAME, Some(id.into())),
    )
    .await;

    Ok(ApiResponse::ok(record))
}

#[tracing::instrument(skip_all, fields(entity = R::NAME))]
async fn remove<R: Resource>(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<ApiResponse<R::Record>> {
    let id: R::Id = parse_id(&id)?;
    let record = resource::delete::<R>(state.pool(), id).await?;

    tracing::info!(id = %id, user_id = %user.id, "Record deleted");
    activity::record(
        state.pool(),
        client.entry(Some(user.id), ActivityAction::Delete, R::NAME, Some(id.into())),
    )
    .await;

    Ok(ApiResponse::ok(record))
}
