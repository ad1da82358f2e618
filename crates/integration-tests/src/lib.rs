//! Integration tests for Storedesk.
//!
//! The tests talk to a running server over HTTP and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! sd-cli migrate
//! SD_USER_PASSWORD='Admin#2026pass' sd-cli user create -e admin@example.org -u admin -n Admin
//! cargo run -p storedesk-admin &
//! cargo test -p storedesk-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SD_TEST_BASE_URL` - server root (default `http://127.0.0.1:8889`)
//! - `SD_TEST_ADMIN_EMAIL` / `SD_TEST_ADMIN_PASSWORD` - an admin account

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};

/// Server root, without the `/api/v1` prefix.
#[must_use]
pub fn base_url() -> String {
    std::env::var("SD_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8889".to_string())
        .trim_end_matches('/')
        .to_owned()
}

/// Full URL of an API path such as `/brands`.
#[must_use]
pub fn api_url(path: &str) -> String {
    format!("{}/api/v1{path}", base_url())
}

/// A short random suffix so repeated runs don't collide on unique names.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

/// Credentials of the admin account the tests log in with.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("SD_TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.org".to_string()),
        std::env::var("SD_TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "Admin#2026pass".to_string()),
    )
}

/// HTTP client carrying a bearer token.
pub struct TestContext {
    pub client: Client,
    pub access_token: String,
    pub refresh_token: String,
    pub user: Value,
}

impl TestContext {
    /// Log in as the configured admin.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or the login is rejected.
    pub async fn admin() -> Self {
        let (email, password) = admin_credentials();
        Self::login(&email, &password).await
    }

    /// Log in with the given credentials.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or the login is rejected.
    pub async fn login(email: &str, password: &str) -> Self {
        let client = Client::new();
        let resp = client
            .post(api_url("/auth/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");

        let body: Value = resp.json().await.expect("Failed to parse login response");
        let data = &body["data"];
        Self {
            access_token: data["tokens"]["accessToken"]
                .as_str()
                .expect("missing accessToken")
                .to_owned(),
            refresh_token: data["tokens"]["refreshToken"]
                .as_str()
                .expect("missing refreshToken")
                .to_owned(),
            user: data["user"].clone(),
            client,
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(api_url(path)).bearer_auth(&self.access_token)
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(api_url(path)).bearer_auth(&self.access_token)
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(api_url(path)).bearer_auth(&self.access_token)
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(api_url(path)).bearer_auth(&self.access_token)
    }

    /// `POST` a JSON body, expect `201`, and return the created record.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the status is not `201 Created`.
    pub async fn create(&self, path: &str, body: &Value) -> Value {
        let resp = self
            .post(path)
            .json(body)
            .send()
            .await
            .expect("Failed to send create request");
        let status = resp.status();
        let body: Value = resp.json().await.expect("Failed to parse create response");
        assert_eq!(status, StatusCode::CREATED, "create {path} failed: {body}");
        assert_eq!(body["message"], "Created");
        body["data"].clone()
    }

    /// Delete a record, ignoring failures. Used for cleanup.
    pub async fn cleanup(&self, path: &str) {
        let _ = self.delete(path).send().await;
    }
}

/// Read a response as `(status, body)`.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.expect("Response body is not JSON");
    (status, body)
}

/// The `_id` of a record as used in URLs.
///
/// # Panics
///
/// Panics if the record has no numeric `_id`.
#[must_use]
pub fn id_of(record: &Value) -> i64 {
    record["_id"].as_i64().expect("record without _id")
}
