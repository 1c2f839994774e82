use std::sync::Arc;

use crate::auth::token::TokenError;
use crate::auth::{BruteForceGuard, CsrfGuard, SecurityEventLog, TokenService};
use crate::config::AppConfig;
use crate::store::UserStore;

/// Shared application state: the auth components, constructed once from the
/// resolved configuration, plus the UserStore collaborator.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub events: Arc<SecurityEventLog>,
    pub guard: Arc<BruteForceGuard>,
    pub csrf: Arc<CsrfGuard>,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    /// Fails when the signing key is missing under Strict posture; the
    /// process must refuse to serve traffic in that case.
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, TokenError> {
        let events = Arc::new(SecurityEventLog::new(&config.events));
        let tokens = Arc::new(TokenService::new(config.posture, &config.auth)?);
        let guard = Arc::new(BruteForceGuard::new(&config.lockout, events.clone()));
        let csrf = Arc::new(CsrfGuard::new(&config.csrf));

        Ok(Self {
            config: Arc::new(config),
            tokens,
            events,
            guard,
            csrf,
            store,
        })
    }
}
