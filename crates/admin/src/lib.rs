//! Storedesk back-office API library.
//!
//! This crate provides the REST API as a library, allowing the router to be
//! tested without binding a socket and reused by the CLI for its models and
//! repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::{
    Router,
    http::{HeaderValue, header},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use config::CorsOrigins;
use error::AppError;
use state::AppState;

/// Build the CORS layer from the configured origins.
fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads().dir());

    Router::new()
        .merge(routes::health_routes())
        .nest("/api/v1", routes::api_routes(&state))
        .nest_service("/uploads", uploads)
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors_layer(&state.config().cors_origins))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use storedesk_core::{UserId, UserRole};
    use tower::ServiceExt;

    use config::{AdminConfig, TokenConfig, UploadConfig};
    use services::TokenKind;

    const SECRET: &str = "q8Vf!2kLz#7RmW4xN9pT@1cY6bH3jD5s";

    /// State over a pool that never connects; only routes that reject
    /// before touching the database are exercised here.
    fn test_state() -> AppState {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://storedesk@127.0.0.1:1/storedesk"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8889,
            base_url: "http://127.0.0.1:8889".to_string(),
            tokens: TokenConfig {
                secret: SecretString::from(SECRET),
                access_ttl_secs: 3600,
                refresh_ttl_secs: 604_800,
            },
            uploads: UploadConfig {
                dir: PathBuf::from("target/test-uploads"),
                max_bytes: 1024,
            },
            cors_origins: CorsOrigins::Any,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://storedesk@127.0.0.1:1/storedesk")
            .unwrap();
        AppState::new(config, pool)
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_list_requires_token() {
        let (status, body) = send(Request::get("/api/v1/brands").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn test_aliases_are_routed() {
        for path in [
            "/api/v1/productattributes",
            "/api/v1/productvariants",
            "/api/v1/activityLogs",
            "/api/v1/activity-logs/3",
        ] {
            let (status, _) = send(Request::get(path).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let (status, body) = send(
            Request::get("/api/v1/orders")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let state = test_state();
        let refresh = state
            .tokens()
            .issue(UserId::new(1), UserRole::Admin, TokenKind::Refresh, Utc::now())
            .unwrap();
        let response = app(state)
            .oneshot(
                Request::get("/api/v1/auth/profile")
                    .header("authorization", format!("Bearer {refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_validates_body() {
        let (status, body) = send(
            Request::post("/api/v1/auth/login")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "198.51.100.20")
                .body(Body::from(r#"{"email":"mai@example.org"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let (status, body) = send(
            Request::post("/api/v1/auth/refresh-token")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(Request::get("/api/v1/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }
}
