// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Internal authentication failure taxonomy.
///
/// These variants exist for the Security Event Log and for tests; clients only
/// ever see the generic `ApiError` each maps to. Token and identity problems
/// collapse to 401, CSRF and lockout problems to 403, and a store outage is a
/// server fault (500) — never an authentication verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    NoToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("expired token")]
    ExpiredToken,
    #[error("bad token signature")]
    BadSignature,
    #[error("token subject does not resolve to an account")]
    UnknownSubject,
    #[error("client address is locked out")]
    Locked { retry_after_secs: u64 },
    #[error("csrf token missing")]
    CsrfMissing,
    #[error("csrf token mismatch")]
    CsrfMismatch,
    #[error("user store unavailable")]
    StoreUnavailable,
}

impl AuthError {
    /// Short identifier used in event-log metadata.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NoToken => "no_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::BadSignature => "bad_signature",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::Locked { .. } => "locked",
            AuthError::CsrfMissing => "csrf_missing",
            AuthError::CsrfMismatch => "csrf_mismatch",
            AuthError::StoreUnavailable => "store_unavailable",
        }
    }
}

/// HTTP API error with appropriate status codes and client-safe messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 403 Forbidden with a Retry-After hint (lockout)
    Locked { retry_after_secs: u64 },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::Locked { .. } => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::Locked { .. } => "Too many failed attempts, try again later",
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Locked { .. } => "LOCKED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Collapse the internal taxonomy to the two generic client-facing statuses.
// Detail belongs in the Security Event Log, never in the response body.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::BadSignature
            | AuthError::UnknownSubject => ApiError::unauthorized("Authentication required"),
            AuthError::Locked { retry_after_secs } => ApiError::Locked { retry_after_secs },
            AuthError::CsrfMissing => {
                ApiError::forbidden("CSRF_TOKEN_MISSING")
            }
            AuthError::CsrfMismatch => {
                ApiError::forbidden("CSRF_TOKEN_INVALID")
            }
            AuthError::StoreUnavailable => {
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::DuplicateUsername => {
                ApiError::conflict("Username already taken")
            }
            crate::store::StoreError::Unavailable(msg) => {
                // Log the real error but return a generic message
                tracing::error!("User store error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::auth::token::TokenError> for ApiError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        tracing::error!("token issuance failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let ApiError::Locked { retry_after_secs } = &self {
            let mut response = (status, Json(self.to_json())).into_response();
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
            return response;
        }

        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_collapse_to_generic_401() {
        for err in [
            AuthError::NoToken,
            AuthError::MalformedToken,
            AuthError::ExpiredToken,
            AuthError::BadSignature,
            AuthError::UnknownSubject,
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), 401);
            assert_eq!(api.message(), "Authentication required");
        }
    }

    #[test]
    fn csrf_and_lockout_map_to_403() {
        assert_eq!(ApiError::from(AuthError::CsrfMissing).status_code(), 403);
        assert_eq!(ApiError::from(AuthError::CsrfMismatch).status_code(), 403);
        assert_eq!(
            ApiError::from(AuthError::Locked { retry_after_secs: 60 }).status_code(),
            403
        );
    }

    #[test]
    fn store_outage_is_a_server_fault() {
        let api: ApiError = AuthError::StoreUnavailable.into();
        assert_eq!(api.status_code(), 500);
    }
}
