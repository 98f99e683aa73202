// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use leetlog::config::{Config, DatabaseConfig, DatabaseMode};
use leetlog::db::Db;
use leetlog::middleware::auth::create_session_token;
use leetlog::routes::create_router;
use leetlog::AppState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Check if a test database is configured.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("DATABASE_URL_TEST").is_ok_and(|url| !url.trim().is_empty())
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: DATABASE_URL_TEST not set");
            return;
        }
    };
}

/// Connect to the test database and apply migrations.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    let url = std::env::var("DATABASE_URL_TEST").expect("DATABASE_URL_TEST not set");
    let config = DatabaseConfig {
        mode: DatabaseMode::Test,
        url,
        branch: None,
        max_connections: 5,
    };
    Db::connect(&config)
        .await
        .expect("Failed to connect to test database")
}

/// Create an offline database handle.
#[allow(dead_code)]
pub fn test_db_offline() -> Db {
    Db::new_mock()
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}

/// Create a test app around the given database handle.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: Db) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db,
    });
    (create_router(state.clone()), state)
}

/// Create a valid session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_session_token(user_id, signing_key, 3600).expect("Failed to sign session token")
}

/// A user id no other test run will reuse.
#[allow(dead_code)]
pub fn unique_user_id(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!(
        "{prefix}_{nanos}_{}",
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Build an authenticated request.
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

/// Build a multipart body holding one file field.
#[allow(dead_code)]
pub fn multipart_body(field: &str, file_name: &str, contents: &[u8]) -> (String, Vec<u8>) {
    let boundary = "leetlog-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
