//! Public endpoint integration tests
//!
//! Covers:
//! - GET /api/health: liveness probe
//! - GET /api/system/version: build info
//! - everything else under /api requires a token

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tower::util::ServiceExt;

mod common;
use common::{body_json, build_app_state_without_push, create_test_db, get_request};

use clinic_portal::endpoints::create_router;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let db = create_test_db().await;
    let app = create_router(build_app_state_without_push(db));

    let response = app.oneshot(get_request("/api/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(String::from_utf8_lossy(&body_bytes).trim(), "OK");
}

#[tokio::test]
async fn test_version_is_public() {
    let db = create_test_db().await;
    let app = create_router(build_app_state_without_push(db));

    let response = app
        .oneshot(get_request("/api/system/version", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["commit_hash"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let db = create_test_db().await;
    let app = create_router(build_app_state_without_push(db));

    for uri in [
        "/api/push/vapid-public-key",
        "/api/push/subscriptions",
        "/api/notifications/history",
        "/api/notifications/received",
        "/api/notifications/preferences",
    ] {
        let response = app.clone().oneshot(get_request(uri, None)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} must require authentication",
            uri
        );
    }
}
