// handlers/auth/login.rs - POST /auth/login handler

use axum::{extract::State, response::Json};
use serde::Deserialize;

use super::{utils, SessionResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ClientMeta};
use crate::state::AppState;
use crate::store::PublicUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - Authenticate credentials and receive a bearer token.
///
/// The failure response never distinguishes an unknown username from a wrong
/// password; the distinction exists only in the event log.
pub async fn login_post(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<SessionResponse> {
    // A store outage is a 500 via From<StoreError>, not an auth failure,
    // and is deliberately not counted by the brute-force guard.
    let user = state.store.get_user_by_username(&payload.username).await?;

    let user = match user {
        Some(user) if utils::verify_password(&payload.password, &user.password_hash) => user,
        rejected => {
            let reason = if rejected.is_some() {
                "invalid_password"
            } else {
                "unknown_username"
            };
            state.guard.record_failure(meta.addr);
            state.events.record_auth_attempt(
                false,
                rejected.map(|u| u.id),
                meta.addr,
                meta.user_agent.as_deref(),
                Some(reason),
            );
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    state.guard.record_success(meta.addr);
    state.events.record_auth_attempt(
        true,
        Some(user.id),
        meta.addr,
        meta.user_agent.as_deref(),
        None,
    );

    let token = state.tokens.issue_default(user.id)?;

    Ok(ApiResponse::success(SessionResponse {
        user: PublicUser::from(&user),
        token,
        expires_in: state.tokens.default_ttl().num_seconds(),
    }))
}
