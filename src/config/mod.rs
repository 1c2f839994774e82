use serde::{Deserialize, Serialize};
use std::env;

/// Governing security posture, resolved once at process start.
///
/// Every relaxed developer convenience hangs off this single value. Components
/// receive their configuration at construction and never re-read the
/// environment afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityPosture {
    /// Production posture: no bypasses, durable event log, tight lockout.
    Strict,
    /// Development posture: relaxed lockout, optional dev conveniences.
    Permissive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub posture: SecurityPosture,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub csrf: CsrfConfig,
    pub lockout: LockoutConfig,
    pub events: EventLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key. Required under Strict posture; under Permissive a
    /// throwaway key is generated when absent.
    pub token_secret: Option<String>,
    /// Standard bearer token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Lifetime for tokens issued by the development login path.
    pub dev_token_ttl_hours: i64,
    /// Exposes POST /auth/dev-login. Separate from the posture on purpose:
    /// Permissive alone never enables it.
    pub dev_login_enabled: bool,
    /// Lets the designated synthetic subject resolve to a placeholder
    /// identity instead of being rejected as unknown.
    pub allow_synthetic_identity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// The one named switch for skipping CSRF validation. Only honored under
    /// Permissive posture.
    pub enforced: bool,
    pub cookie_name: String,
    pub header_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    pub failure_threshold: u32,
    pub lockout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogConfig {
    /// Durable JSON-lines sink. `None` means console only.
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let posture = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => SecurityPosture::Strict,
            _ => SecurityPosture::Permissive,
        };

        // Posture picks the defaults, env vars override individual values.
        match posture {
            SecurityPosture::Strict => Self::strict(),
            SecurityPosture::Permissive => Self::permissive(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.auth.token_secret = Some(v);
            }
        }
        if let Ok(v) = env::var("AUTH_TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = v.parse().unwrap_or(self.auth.token_ttl_hours);
        }
        if let Ok(v) = env::var("LOCKOUT_FAILURE_THRESHOLD") {
            self.lockout.failure_threshold = v.parse().unwrap_or(self.lockout.failure_threshold);
        }
        if let Ok(v) = env::var("LOCKOUT_DURATION_SECS") {
            self.lockout.lockout_secs = v.parse().unwrap_or(self.lockout.lockout_secs);
        }
        if let Ok(v) = env::var("SECURITY_EVENT_LOG_PATH") {
            self.events.file_path = Some(v);
        }

        // Developer conveniences are only configurable under Permissive
        // posture. A Strict deployment carrying these vars is a
        // misconfiguration worth flagging, not honoring.
        if let Ok(v) = env::var("AUTH_DEV_LOGIN_ENABLED") {
            match self.posture {
                SecurityPosture::Permissive => {
                    self.auth.dev_login_enabled = v.parse().unwrap_or(self.auth.dev_login_enabled);
                }
                SecurityPosture::Strict => {
                    tracing::warn!("AUTH_DEV_LOGIN_ENABLED ignored under Strict posture");
                }
            }
        }
        if let Ok(v) = env::var("AUTH_ALLOW_SYNTHETIC_IDENTITY") {
            match self.posture {
                SecurityPosture::Permissive => {
                    self.auth.allow_synthetic_identity =
                        v.parse().unwrap_or(self.auth.allow_synthetic_identity);
                }
                SecurityPosture::Strict => {
                    tracing::warn!("AUTH_ALLOW_SYNTHETIC_IDENTITY ignored under Strict posture");
                }
            }
        }
        if let Ok(v) = env::var("AUTH_CSRF_ENFORCED") {
            match self.posture {
                SecurityPosture::Permissive => {
                    self.csrf.enforced = v.parse().unwrap_or(self.csrf.enforced);
                }
                SecurityPosture::Strict => {
                    tracing::warn!("AUTH_CSRF_ENFORCED ignored under Strict posture");
                }
            }
        }

        self
    }

    pub fn strict() -> Self {
        Self {
            posture: SecurityPosture::Strict,
            server: ServerConfig { port: 3000 },
            auth: AuthConfig {
                token_secret: None,
                token_ttl_hours: 24 * 7,
                dev_token_ttl_hours: 4,
                dev_login_enabled: false,
                allow_synthetic_identity: false,
            },
            csrf: CsrfConfig {
                enforced: true,
                cookie_name: "csrf-token".to_string(),
                header_name: "x-csrf-token".to_string(),
            },
            lockout: LockoutConfig {
                failure_threshold: 5,
                lockout_secs: 30 * 60,
                sweep_interval_secs: 60,
            },
            events: EventLogConfig {
                file_path: Some("security-events.log".to_string()),
            },
        }
    }

    pub fn permissive() -> Self {
        Self {
            posture: SecurityPosture::Permissive,
            server: ServerConfig { port: 3000 },
            auth: AuthConfig {
                token_secret: None,
                token_ttl_hours: 24 * 7,
                dev_token_ttl_hours: 4,
                dev_login_enabled: false,
                allow_synthetic_identity: false,
            },
            csrf: CsrfConfig {
                enforced: true,
                cookie_name: "csrf-token".to_string(),
                header_name: "x-csrf-token".to_string(),
            },
            // High threshold and short lockout so local iteration is never
            // blocked by a fat-fingered password.
            lockout: LockoutConfig {
                failure_threshold: 100,
                lockout_secs: 60,
                sweep_interval_secs: 60,
            },
            events: EventLogConfig { file_path: None },
        }
    }
}
