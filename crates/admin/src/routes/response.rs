//! Response envelope and request extractors shared by every route.
//!
//! Successful responses are `{ "statusCode", "message", "data" }`; lists put
//! their records under the entity's collection key next to `pagination`.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use storedesk_core::{InvalidId, Page, Pagination};

use crate::error::AppError;

/// Success envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    status_code: u16,
    message: &'static str,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 Success`.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            status_code: 200,
            message: "Success",
            data,
        }
    }

    /// `201 Created`.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            status_code: 201,
            message: "Created",
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// One page of records keyed by collection name.
#[derive(Debug)]
pub struct Listing<T> {
    collection: &'static str,
    page: Page<T>,
}

impl<T> Listing<T> {
    pub const fn new(collection: &'static str, page: Page<T>) -> Self {
        Self { collection, page }
    }

    /// A listing with every record on one page.
    pub fn all(collection: &'static str, items: Vec<T>) -> Self {
        let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let limit = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            collection,
            page: Page {
                items,
                pagination: Pagination {
                    total_record: total,
                    limit,
                    page: 1,
                },
            },
        }
    }
}

impl<T: Serialize> Serialize for Listing<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.collection, &self.page.items)?;
        map.serialize_entry("pagination", &self.page.pagination)?;
        map.end()
    }
}

/// `Json` that rejects with the API's error envelope instead of plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Parse a path id, answering 400 for anything but a positive integer.
pub fn parse_id<I>(raw: &str) -> Result<I, AppError>
where
    I: std::str::FromStr<Err = InvalidId>,
{
    raw.parse()
        .map_err(|e: InvalidId| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::body::to_bytes;
    use storedesk_core::{BrandId, PageRequest};

    #[tokio::test]
    async fn test_created_envelope() {
        let response = ApiResponse::created(serde_json::json!({"_id": 3})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"statusCode": 201, "message": "Created", "data": {"_id": 3}})
        );
    }

    #[test]
    fn test_listing_uses_collection_key() {
        let page = Page {
            items: vec!["a", "b"],
            pagination: PageRequest::new(Some(2), Some(2)).unwrap().paginate(5),
        };
        let json = serde_json::to_value(Listing::new("brands", page)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "brands": ["a", "b"],
                "pagination": {"totalRecord": 5, "limit": 2, "page": 2}
            })
        );
    }

    #[test]
    fn test_listing_all() {
        let json = serde_json::to_value(Listing::all("categories", vec![1, 2, 3])).unwrap();
        assert_eq!(json["pagination"]["totalRecord"], 3);
        assert_eq!(json["categories"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<BrandId>("12").unwrap(), BrandId::new(12));
        assert!(matches!(parse_id::<BrandId>("abc"), Err(AppError::BadRequest(_))));
        assert!(parse_id::<BrandId>("0").is_err());
    }
}
