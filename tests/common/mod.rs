use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use clarity_api::app::app;
use clarity_api::config::AppConfig;
use clarity_api::state::AppState;
use clarity_api::store::{MemoryUserStore, NewUser, UserStore};

/// In-process test harness: the full router plus handles to its state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Permissive config with a fixed signing key and no event-log file, so tests
/// never touch the filesystem. CSRF is off by default here; the CSRF suite
/// turns it back on explicitly.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::permissive();
    config.auth.token_secret = Some("integration-test-secret".to_string());
    config.events.file_path = None;
    config.csrf.enforced = false;
    config
}

pub async fn build_app(config: AppConfig) -> Result<TestApp> {
    build_app_with_store(config, Arc::new(MemoryUserStore::new())).await
}

pub async fn build_app_with_store(
    config: AppConfig,
    store: Arc<dyn UserStore>,
) -> Result<TestApp> {
    // Seed the standard demo account
    store
        .create_user(NewUser {
            username: "demo".to_string(),
            password_hash: bcrypt::hash("password", bcrypt::DEFAULT_COST)?,
            display_name: Some("Demo User".to_string()),
        })
        .await
        .ok();

    let state = AppState::new(config, store)?;
    Ok(TestApp {
        router: app(state.clone()),
        state,
    })
}

/// Drive one request through the router and decode the JSON body.
pub async fn send(
    router: &Router,
    request: Request<Body>,
) -> Result<(StatusCode, axum::http::HeaderMap, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, headers, body))
}

pub fn json_post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

/// Log in as demo/password and return the bearer token.
pub async fn login_token(router: &Router) -> Result<String> {
    let (status, _, body) = send(
        router,
        json_post(
            "/auth/login",
            serde_json::json!({"username": "demo", "password": "password"}),
        ),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
    Ok(body["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string())
}
