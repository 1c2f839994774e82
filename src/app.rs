use axum::{middleware, routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::auth;
use crate::middleware::{auth_gate_middleware, csrf_middleware, lockout_middleware};
use crate::state::AppState;

/// Build the service router. Execution order per request: trace, CORS,
/// lockout check, CSRF validation, then routing (with the authentication
/// gate mounted on protected routes only).
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API behind the authentication gate
        .merge(protected_routes(state.clone()))
        // Global middleware; the last layer added runs first
        .layer(middleware::from_fn_with_state(state.clone(), csrf_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), lockout_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/dev-login", post(auth::dev_login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route_layer(middleware::from_fn_with_state(state, auth_gate_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Clarity Auth API",
            "version": version,
            "description": "Authentication layer for the Clarity productivity API",
            "endpoints": {
                "home": "/ (public)",
                "login": "/auth/login (public - token acquisition)",
                "register": "/auth/register (public)",
                "whoami": "/api/auth/whoami (protected)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
