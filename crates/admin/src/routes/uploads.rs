//! Image upload routes.
//!
//! ```text
//! POST /uploads/single/{collection} - multipart field `file`, returns { url }
//! POST /uploads/{collection}        - multipart field `files` (up to 10), returns { urls }
//! ```

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;

use super::response::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::uploads::{MAX_FILES, UploadError, UploadedFile};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let uploads = state.uploads();
    Router::new()
        .route(
            "/single/{collection}",
            post(single).layer(DefaultBodyLimit::max(uploads.body_limit(1))),
        )
        .route(
            "/{collection}",
            post(multiple).layer(DefaultBodyLimit::max(uploads.body_limit(MAX_FILES))),
        )
}

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedMany {
    pub urls: Vec<String>,
}

fn multipart_error(err: &MultipartError, limit: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::Multipart(err.body_text())
    }
}

/// Collect the parts named `field`, ignoring everything else.
async fn read_files(
    multipart: &mut Multipart,
    field: &str,
    max_files: usize,
    limit: usize,
) -> std::result::Result<Vec<UploadedFile>, UploadError> {
    let mut files = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit))?
    {
        if part.name() != Some(field) {
            continue;
        }
        if files.len() == max_files {
            return Err(UploadError::TooManyFiles { max: max_files });
        }
        let file_name = part.file_name().map(str::to_owned);
        let content_type = part.content_type().map(str::to_owned);
        let bytes = part.bytes().await.map_err(|e| multipart_error(&e, limit))?;
        files.push(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Ok(files)
}

async fn single(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(collection): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiResponse<Uploaded>> {
    let uploads = state.uploads();
    let files = read_files(&mut multipart, "file", 1, uploads.max_bytes()).await?;
    let file = files.first().ok_or(UploadError::MissingFile)?;

    let url = uploads.save(&collection, file).await?;
    Ok(ApiResponse::ok(Uploaded { url }))
}

async fn multiple(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(collection): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiResponse<UploadedMany>> {
    let uploads = state.uploads();
    let files = read_files(&mut multipart, "files", MAX_FILES, uploads.max_bytes()).await?;

    let urls = uploads.save_all(&collection, &files).await?;
    tracing::info!(collection, count = urls.len(), "Stored uploads");
    Ok(ApiResponse::ok(UploadedMany { urls }))
}
