use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::error::ApiError;
use crate::middleware::lockout::ClientMeta;
use crate::state::AppState;

/// Validate the double-submit pair on mutating requests, then make sure the
/// client leaves with a CSRF cookie for the next one.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = state
        .csrf
        .validate(request.method(), &jar, request.headers())
    {
        let meta = request
            .extensions()
            .get::<ClientMeta>()
            .cloned()
            .unwrap_or_default();
        state.events.record_violation(
            "csrf validation failed",
            &meta.context(request.method(), request.uri().path()),
        );
        return Err(err.into());
    }

    let (jar, _token) = state.csrf.ensure_token(jar);
    Ok((jar, next.run(request).await).into_response())
}
