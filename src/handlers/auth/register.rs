// handlers/auth/register.rs - POST /auth/register handler

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::json;

use super::{utils, SessionResponse};
use crate::auth::EventLevel;
use crate::middleware::{ApiResponse, ApiResult, ClientMeta};
use crate::state::AppState;
use crate::store::{NewUser, PublicUser};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// POST /auth/register - Create an account and receive a bearer token.
pub async fn register_post(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<SessionResponse> {
    utils::validate_username(&payload.username)?;
    utils::validate_password(&payload.password)?;

    let password_hash = utils::hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            password_hash,
            display_name: payload.display_name,
        })
        .await?;

    state.events.record(
        EventLevel::Info,
        "account registered",
        json!({
            "subject": user.id.to_string(),
            "client_addr": meta.addr.to_string(),
            "user_agent": meta.user_agent,
        }),
    );

    let token = state.tokens.issue_default(user.id)?;

    Ok(ApiResponse::created(SessionResponse {
        user: PublicUser::from(&user),
        token,
        expires_in: state.tokens.default_ttl().num_seconds(),
    }))
}
