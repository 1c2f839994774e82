// handlers/auth/dev_login.rs - POST /auth/dev-login handler

use axum::{extract::State, response::Json};
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::SessionResponse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ClientMeta, SYNTHETIC_SUBJECT};
use crate::state::AppState;
use crate::store::PublicUser;

#[derive(Debug, Deserialize)]
pub struct DevLoginRequest {
    pub username: String,
}

/// POST /auth/dev-login - Password-less login for local development.
///
/// Gated on the explicit `dev_login_enabled` flag, never on posture alone.
/// When the flag is off the route answers 404 so its existence is not
/// confirmed to probes. Tokens issued here use the short 4-hour lifetime.
pub async fn dev_login_post(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(payload): Json<DevLoginRequest>,
) -> ApiResult<SessionResponse> {
    if !state.config.auth.dev_login_enabled {
        return Err(ApiError::not_found("Not found"));
    }

    let (subject, public_user) = match state
        .store
        .get_user_by_username(&payload.username)
        .await?
    {
        Some(user) => (user.id, PublicUser::from(&user)),
        None if state.config.auth.allow_synthetic_identity => (
            SYNTHETIC_SUBJECT,
            PublicUser {
                id: SYNTHETIC_SUBJECT,
                username: payload.username.clone(),
                display_name: Some("Synthetic development identity".to_string()),
                created_at: Utc::now(),
            },
        ),
        None => return Err(ApiError::unauthorized("Invalid credentials")),
    };

    state.events.record_suspicious_activity(
        "development login issued",
        &meta.context(&axum::http::Method::POST, "/auth/dev-login"),
    );

    let ttl = Duration::hours(state.config.auth.dev_token_ttl_hours);
    let token = state.tokens.issue(subject, ttl)?;

    Ok(ApiResponse::success(SessionResponse {
        user: public_user,
        token,
        expires_in: ttl.num_seconds(),
    }))
}
