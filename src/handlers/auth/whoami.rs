// handlers/auth/whoami.rs - GET /api/auth/whoami handler

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - Current authenticated identity, public fields only.
///
/// The gate has already run; the handler just reads the resolved identity.
pub async fn whoami_get(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
