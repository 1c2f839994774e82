mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use clarity_api::store::{NewUser, StoreError, User, UserStore};
use common::{build_app, build_app_with_store, login_token, send, test_config};

fn login_from(addr: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", addr)
        .body(Body::from(
            json!({"username": username, "password": password}).to_string(),
        ))
        .expect("request")
}

fn whoami_from(addr: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/api/auth/whoami")
        .header("x-forwarded-for", addr)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn five_failures_lock_the_address_even_for_valid_tokens() -> Result<()> {
    let mut config = test_config();
    config.lockout.failure_threshold = 5;
    config.lockout.lockout_secs = 1800;
    let app = build_app(config).await?;

    let token = login_token(&app.router).await?;

    for _ in 0..5 {
        let (status, _, _) = send(
            &app.router,
            login_from("203.0.113.7", "demo", "wrong-password"),
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // 6th request from the locked address is rejected before anything else,
    // valid token or not
    let (status, headers, body) = send(&app.router, whoami_from("203.0.113.7", &token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "LOCKED");
    let retry_after: u64 = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("retry-after header");
    assert!(retry_after > 0 && retry_after <= 1800);

    // a different client address is unaffected
    let (status, _, _) = send(&app.router, whoami_from("203.0.113.8", &token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn success_resets_the_failure_count() -> Result<()> {
    let mut config = test_config();
    config.lockout.failure_threshold = 5;
    let app = build_app(config).await?;

    for _ in 0..4 {
        send(
            &app.router,
            login_from("203.0.113.9", "demo", "wrong-password"),
        )
        .await?;
    }
    let (status, _, _) = send(&app.router, login_from("203.0.113.9", "demo", "password")).await?;
    assert_eq!(status, StatusCode::OK);

    // counter is back to zero: four more failures stay under the threshold
    for _ in 0..4 {
        let (status, _, _) = send(
            &app.router,
            login_from("203.0.113.9", "demo", "wrong-password"),
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn expired_lockout_is_evaluated_normally_again() -> Result<()> {
    let mut config = test_config();
    config.lockout.failure_threshold = 1;
    config.lockout.lockout_secs = 0;
    let app = build_app(config).await?;

    let (status, _, _) = send(
        &app.router,
        login_from("203.0.113.10", "demo", "wrong-password"),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    tokio::time::sleep(std::time::Duration::from_millis(30)).await;

    let (status, _, _) = send(&app.router, login_from("203.0.113.10", "demo", "password")).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

/// Store that always reports an infrastructure failure.
struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn create_user(&self, _new_user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_outage_is_a_500_and_never_locks_clients_out() -> Result<()> {
    let mut config = test_config();
    config.lockout.failure_threshold = 1;
    config.lockout.lockout_secs = 1800;
    let app = build_app_with_store(config, Arc::new(FailingStore)).await?;

    let (status, _, body) = send(
        &app.router,
        login_from("203.0.113.11", "demo", "password"),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // generic body, no infrastructure detail
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");

    // with threshold 1, a counted failure would have locked this address;
    // the outage must not have
    assert!(app
        .state
        .guard
        .check("203.0.113.11".parse().unwrap())
        .is_ok());
    Ok(())
}
