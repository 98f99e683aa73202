// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without a valid session
//! 2. Valid sessions get past the middleware (cookie or bearer)
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

const PROTECTED: &[(&str, &str)] = &[
    ("GET", "/api/problems"),
    ("POST", "/api/problems"),
    ("GET", "/api/problems/1"),
    ("PUT", "/api/problems/1"),
    ("DELETE", "/api/problems/1"),
    ("GET", "/api/problems/export"),
    ("POST", "/api/problems/import"),
    ("GET", "/api/stats"),
];

fn problem_body() -> Body {
    Body::from(
        serde_json::json!({
            "title": "Two Sum",
            "url": "https://leetcode.com/problems/two-sum/",
            "difficulty": "EASY",
            "language_used": "Rust"
        })
        .to_string(),
    )
}

#[tokio::test]
async fn test_protected_routes_without_session() {
    let (app, _) = common::create_test_app();

    for (method, uri) in PROTECTED {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(*method)
                    .uri(*uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(problem_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should require a session"
        );
        let json = common::body_json(response).await;
        assert_eq!(json, serde_json::json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn test_token_signed_with_wrong_key() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("user_1", b"some_other_key_entirely_32_bytes");

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/problems",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let (app, _) = common::create_test_app();

    for value in ["Bearer", "Bearer not.a.jwt", "Basic dXNlcjpwYXNz"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/stats")
                    .header(header::AUTHORIZATION, value)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
}

#[tokio::test]
async fn test_expired_token() {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use leetlog::middleware::auth::Claims;

    let (app, state) = common::create_test_app();
    let claims = Claims {
        sub: "user_1".to_string(),
        iat: 1_000_000,
        exp: 1_000_060,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&state.config.session_signing_key),
    )
    .unwrap();

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/problems",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_bearer_passes_middleware() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user_1", &state.config.session_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/problems",
            &token,
            Body::empty(),
        ))
        .await
        .unwrap();

    // Offline database: the handler runs and fails at storage, not at auth.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = common::body_json(response).await;
    assert_eq!(json["error"], "Internal server error");
}

#[tokio::test]
async fn test_valid_session_cookie_passes_middleware() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user_1", &state.config.session_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header(header::COOKIE, format!("__session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    let json = common::body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mode"], "test");
}

#[tokio::test]
async fn test_cors_preflight_from_frontend() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/problems")
                .header(header::ORIGIN, state.config.frontend_url.as_str())
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        state.config.frontend_url.as_str()
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/problems")
                .header(header::ORIGIN, "https://evil.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
