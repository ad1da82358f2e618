//! Integration tests for authentication and the response envelopes.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sd-cli migrate`)
//! - An admin account (`sd-cli user create ... -r admin`)
//! - The admin server running (`cargo run -p storedesk-admin`)

use reqwest::{Client, StatusCode};
use serde_json::json;
use storedesk_integration_tests::{TestContext, admin_credentials, api_url, base_url, read};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_and_readiness() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_login_returns_user_and_tokens() {
    let ctx = TestContext::admin().await;
    let (email, _) = admin_credentials();

    assert_eq!(
        ctx.user["email"].as_str().map(str::to_lowercase),
        Some(email.to_lowercase())
    );
    assert_eq!(ctx.user["roles"], "admin");
    assert!(ctx.user.get("password").is_none());
    assert!(ctx.user.get("passwordHash").is_none());
    assert_eq!(ctx.access_token.split('.').count(), 3);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_login_wrong_password() {
    let (email, _) = admin_credentials();
    let resp = Client::new()
        .post(api_url("/auth/login"))
        .json(&json!({"email": email, "password": "definitely-wrong-1"}))
        .send()
        .await
        .expect("Failed to send login request");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["statusCode"], 401);
    assert!(body.get("data").is_none());
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_profile_and_refresh() {
    let ctx = TestContext::admin().await;

    let (status, body) = read(ctx.get("/auth/profile").send().await.expect("profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["_id"], ctx.user["_id"]);

    let resp = ctx
        .client
        .post(api_url("/auth/refresh-token"))
        .json(&json!({"refreshToken": ctx.refresh_token}))
        .send()
        .await
        .expect("Failed to refresh");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["tokens"]["accessToken"].is_string());

    // An access token is not accepted as a refresh token.
    let resp = ctx
        .client
        .post(api_url("/auth/refresh-token"))
        .json(&json!({"refreshToken": ctx.access_token}))
        .send()
        .await
        .expect("Failed to refresh");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_protected_route_without_token() {
    let resp = Client::new()
        .get(api_url("/orders"))
        .send()
        .await
        .expect("Failed to reach server");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}
