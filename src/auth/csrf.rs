use axum::http::{HeaderMap, Method};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::config::CsrfConfig;
use crate::error::AuthError;

const TOKEN_LEN: usize = 32;

/// Double-submit-cookie CSRF defense.
///
/// A single random value lives in a cookie on the client and must be echoed
/// back in the `x-csrf-token` header on every mutating request. The cookie is
/// deliberately NOT httpOnly: the SPA reads it with JavaScript to populate the
/// header, and same-origin policy keeps other origins from doing the same.
/// There is no server-side record; the cookie is the source of truth.
pub struct CsrfGuard {
    enforced: bool,
    cookie_name: String,
    header_name: String,
}

impl CsrfGuard {
    pub fn new(config: &CsrfConfig) -> Self {
        Self {
            enforced: config.enforced,
            cookie_name: config.cookie_name.clone(),
            header_name: config.header_name.clone(),
        }
    }

    /// Make sure the client holds a CSRF cookie, generating one on first
    /// contact. Idempotent: an existing token is returned unchanged, never
    /// silently rotated.
    pub fn ensure_token(&self, jar: CookieJar) -> (CookieJar, String) {
        if let Some(existing) = jar.get(&self.cookie_name) {
            let value = existing.value().to_string();
            if !value.is_empty() {
                return (jar, value);
            }
        }

        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        let cookie = Cookie::build((self.cookie_name.clone(), token.clone()))
            .http_only(false)
            .same_site(SameSite::Lax)
            .path("/".to_string())
            .build();

        (jar.add(cookie), token)
    }

    /// Accept safe methods unconditionally; require a present, byte-equal
    /// cookie/header pair for mutating methods.
    pub fn validate(
        &self,
        method: &Method,
        jar: &CookieJar,
        headers: &HeaderMap,
    ) -> Result<(), AuthError> {
        if !self.enforced {
            return Ok(());
        }
        if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
            return Ok(());
        }

        let cookie_token = jar
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());
        let header_token = headers
            .get(&self.header_name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty());

        match (cookie_token, header_token) {
            (Some(cookie), Some(header)) if cookie.as_bytes() == header.as_bytes() => Ok(()),
            (Some(_), Some(_)) => Err(AuthError::CsrfMismatch),
            _ => Err(AuthError::CsrfMissing),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(&CsrfConfig {
            enforced: true,
            cookie_name: "csrf-token".to_string(),
            header_name: "x-csrf-token".to_string(),
        })
    }

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new("csrf-token".to_string(), token.to_string()))
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-csrf-token", HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn safe_methods_always_pass() {
        let guard = guard();
        let jar = CookieJar::new();
        let headers = HeaderMap::new();

        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(guard.validate(&method, &jar, &headers).is_ok());
        }
    }

    #[test]
    fn mutating_request_without_tokens_is_missing() {
        let guard = guard();
        assert_eq!(
            guard.validate(&Method::POST, &CookieJar::new(), &HeaderMap::new()),
            Err(AuthError::CsrfMissing)
        );
    }

    #[test]
    fn cookie_without_header_is_missing() {
        let guard = guard();
        assert_eq!(
            guard.validate(&Method::POST, &jar_with("abc123"), &HeaderMap::new()),
            Err(AuthError::CsrfMissing)
        );
    }

    #[test]
    fn mismatched_pair_is_invalid() {
        let guard = guard();
        assert_eq!(
            guard.validate(&Method::DELETE, &jar_with("abc123"), &headers_with("xyz789")),
            Err(AuthError::CsrfMismatch)
        );
    }

    #[test]
    fn matching_pair_is_accepted() {
        let guard = guard();
        assert!(guard
            .validate(&Method::PUT, &jar_with("abc123"), &headers_with("abc123"))
            .is_ok());
    }

    #[test]
    fn ensure_token_is_idempotent() {
        let guard = guard();
        let (jar, first) = guard.ensure_token(CookieJar::new());
        let (_, second) = guard.ensure_token(jar);

        assert_eq!(first, second);
        assert_eq!(first.len(), TOKEN_LEN);
    }

    #[test]
    fn unenforced_guard_accepts_everything() {
        let guard = CsrfGuard::new(&CsrfConfig {
            enforced: false,
            cookie_name: "csrf-token".to_string(),
            header_name: "x-csrf-token".to_string(),
        });
        assert!(guard
            .validate(&Method::POST, &CookieJar::new(), &HeaderMap::new())
            .is_ok());
    }
}
