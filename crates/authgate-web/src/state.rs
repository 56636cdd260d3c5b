use std::sync::Arc;

use authgate_core::{Clock, CredentialStore, LoginRateLimiter, SessionManager, SystemClock};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionManager>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let sessions = SessionManager::with_clock(
            config.session.secret.as_bytes(),
            config.session_ttl(),
            clock.clone(),
        );
        let login_limiter = LoginRateLimiter::with_clock(
            config.rate_limit.login_max_attempts,
            config.login_window(),
            clock,
        );
        Self {
            config: Arc::new(config),
            credentials: Arc::new(CredentialStore::new()),
            sessions: Arc::new(sessions),
            login_limiter: Arc::new(login_limiter),
        }
    }
}
