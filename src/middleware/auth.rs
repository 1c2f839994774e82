use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::VerifyError;
use crate::error::{ApiError, AuthError};
use crate::middleware::lockout::ClientMeta;
use crate::state::AppState;
use crate::store::User;

/// Subject id reserved for the synthetic development identity. Tokens for any
/// other unknown subject are always rejected.
pub const SYNTHETIC_SUBJECT: Uuid = Uuid::from_u128(999);

/// Authenticated identity attached to the request after the gate accepts it.
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// True only for the placeholder identity minted by the development
    /// bypass; real accounts never set this.
    pub synthetic: bool,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
            synthetic: false,
        }
    }
}

impl AuthUser {
    fn synthetic() -> Self {
        Self {
            id: SYNTHETIC_SUBJECT,
            username: "dev".to_string(),
            display_name: Some("Synthetic development identity".to_string()),
            created_at: Utc::now(),
            synthetic: true,
        }
    }
}

/// Handlers read the resolved identity from request extensions instead of
/// repeating verification themselves.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Authentication gate: bearer extraction, token verification, identity
/// resolution. Runs after the lockout and CSRF middleware; protected routes
/// mount it as a route layer so their handlers only run once it accepts.
pub async fn auth_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let meta = request
        .extensions()
        .get::<ClientMeta>()
        .cloned()
        .unwrap_or_default();

    let token = match extract_bearer_token(request.headers()) {
        Some(token) => token,
        None => return Err(reject(&state, &meta, None, AuthError::NoToken)),
    };

    let claims = state.tokens.verify(&token).map_err(|e| {
        let err = match e {
            VerifyError::Expired => AuthError::ExpiredToken,
            VerifyError::BadSignature => AuthError::BadSignature,
            VerifyError::Malformed => AuthError::MalformedToken,
        };
        reject(&state, &meta, None, err)
    })?;

    let auth_user = match state.store.get_user(claims.sub).await {
        Ok(Some(user)) => AuthUser::from(&user),
        Ok(None) => {
            if state.config.auth.allow_synthetic_identity && claims.sub == SYNTHETIC_SUBJECT {
                state.events.record_suspicious_activity(
                    "synthetic identity resolved for development request",
                    &meta.context(request.method(), request.uri().path()),
                );
                AuthUser::synthetic()
            } else {
                return Err(reject(
                    &state,
                    &meta,
                    Some(claims.sub),
                    AuthError::UnknownSubject,
                ));
            }
        }
        Err(err) => {
            // Infrastructure outage: a server fault, not an auth verdict.
            // Deliberately not counted by the brute-force guard.
            tracing::error!("user store lookup failed during authentication: {}", err);
            return Err(AuthError::StoreUnavailable.into());
        }
    };

    state.guard.record_success(meta.addr);
    state.events.record_auth_attempt(
        true,
        Some(auth_user.id),
        meta.addr,
        meta.user_agent.as_deref(),
        None,
    );

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Record the failure with the guard and the event log, then collapse to the
/// generic client-facing error.
fn reject(
    state: &AppState,
    meta: &ClientMeta,
    subject: Option<Uuid>,
    err: AuthError,
) -> ApiError {
    state.guard.record_failure(meta.addr);
    state.events.record_auth_attempt(
        false,
        subject,
        meta.addr,
        meta.user_agent.as_deref(),
        Some(err.reason()),
    );
    err.into()
}

/// Extract the token from `Authorization: Bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
