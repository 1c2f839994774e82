use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AuthConfig, SecurityPosture};

/// Identity claim embedded in every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub sub: Uuid,
    /// Expiry timestamp (seconds since epoch)
    pub exp: i64,
    /// Issued-at timestamp
    pub iat: i64,
}

/// Token verification failure. Malformed input is a normal, expected input
/// class — verification never panics on attacker-controlled bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("token is not a well-formed JWT")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT_SECRET is required under Strict posture")]
    MissingSigningKey,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Stateless issuer/verifier for signed bearer tokens (HS256).
///
/// The signing key is resolved once at construction. Strict posture refuses
/// to start without a configured key; Permissive posture falls back to a
/// random throwaway key, which makes previously issued tokens unverifiable
/// after a restart.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(posture: SecurityPosture, config: &AuthConfig) -> Result<Self, TokenError> {
        let secret: Vec<u8> = match (&config.token_secret, posture) {
            (Some(secret), _) => secret.as_bytes().to_vec(),
            (None, SecurityPosture::Strict) => return Err(TokenError::MissingSigningKey),
            (None, SecurityPosture::Permissive) => {
                tracing::warn!(
                    "JWT_SECRET not set; using a random throwaway signing key. \
                     All previously issued tokens are now unverifiable."
                );
                let mut key = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                key.to_vec()
            }
        };

        // Zero leeway: a token is expired the instant its exp passes.
        let mut validation = Validation::default();
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
            default_ttl: Duration::hours(config.token_ttl_hours),
        })
    }

    /// Issue a signed token for `subject` with the given lifetime.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Issue a token with the configured default lifetime (7 days).
    pub fn issue_default(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue(subject, self.default_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Check signature and expiry, returning the embedded claim.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerifyError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => VerifyError::BadSignature,
                _ => VerifyError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        let config = AuthConfig {
            token_secret: Some(secret.to_string()),
            token_ttl_hours: 168,
            dev_token_ttl_hours: 4,
            dev_login_enabled: false,
            allow_synthetic_identity: false,
        };
        TokenService::new(SecurityPosture::Strict, &config).unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips_subject() {
        let svc = service("test-secret");
        let subject = Uuid::new_v4();

        let token = svc.issue(subject, Duration::hours(1)).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, subject);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let svc = service("test-secret");
        let token = svc.issue(Uuid::new_v4(), Duration::seconds(-5)).unwrap();

        assert_eq!(svc.verify(&token), Err(VerifyError::Expired));
    }

    #[test]
    fn malformed_inputs_never_panic() {
        let svc = service("test-secret");
        for garbage in ["", "not-a-jwt", "a.b", "a.b.c", "🦀🦀🦀", "eyJhbGciOiJIUzI1NiJ9"] {
            assert_eq!(svc.verify(garbage), Err(VerifyError::Malformed));
        }
    }

    #[test]
    fn token_signed_with_other_key_fails_signature_check() {
        let issuer = service("key-one");
        let verifier = service("key-two");

        let token = issuer.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();
        assert_eq!(verifier.verify(&token), Err(VerifyError::BadSignature));
    }

    #[test]
    fn strict_posture_requires_signing_key() {
        let config = AuthConfig {
            token_secret: None,
            token_ttl_hours: 168,
            dev_token_ttl_hours: 4,
            dev_login_enabled: false,
            allow_synthetic_identity: false,
        };
        assert!(matches!(
            TokenService::new(SecurityPosture::Strict, &config),
            Err(TokenError::MissingSigningKey)
        ));
    }

    #[test]
    fn permissive_posture_generates_throwaway_key() {
        let config = AuthConfig {
            token_secret: None,
            token_ttl_hours: 168,
            dev_token_ttl_hours: 4,
            dev_login_enabled: false,
            allow_synthetic_identity: false,
        };
        let svc = TokenService::new(SecurityPosture::Permissive, &config).unwrap();
        let token = svc.issue_default(Uuid::new_v4()).unwrap();
        assert!(svc.verify(&token).is_ok());
    }
}
