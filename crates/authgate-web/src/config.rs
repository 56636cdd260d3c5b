use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use authgate_core::rate_limit::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Adds `Secure` to the session cookie. Forced on when TLS is configured.
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_window_seconds")]
    pub login_window_seconds: u64,
    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only enable behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Development-only switches. Ignored unless the binary was built with the
/// `debug-endpoints` feature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugConfig {
    #[cfg_attr(not(feature = "debug-endpoints"), allow(dead_code))]
    #[serde(default)]
    pub expose_users: bool,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_session_ttl_seconds() -> u64 { 60 }
fn default_cookie_name() -> String { "authgate.sid".to_string() }
fn default_login_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_login_window_seconds() -> u64 { DEFAULT_WINDOW.as_secs() }

/// Upper bounds keep every `Instant + Duration` in the core well inside range.
const MAX_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
const MAX_LOGIN_WINDOW_SECONDS: u64 = 7 * 24 * 60 * 60;

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_seconds: default_session_ttl_seconds(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: default_login_max_attempts(),
            login_window_seconds: default_login_window_seconds(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

const WEAK_SECRETS: &[&str] = &[
    "contraseña",
    "change-me",
    "changeme",
    "secret",
    "password",
    "session-secret",
    "keyboard cat",
];

impl ServerConfig {
    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_seconds)
    }

    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.login_window_seconds)
    }

    pub fn secure_cookie(&self) -> bool {
        self.session.secure_cookie || self.tls_enabled()
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("AUTHGATE_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_env()?;
        config.ensure_secret();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(addr) = std::env::var("AUTHGATE_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Ok(secret) = std::env::var("AUTHGATE_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Ok(val) = std::env::var("AUTHGATE_SESSION_TTL") {
            self.session.ttl_seconds = val.parse()?;
        }
        if let Ok(cert) = std::env::var("AUTHGATE_TLS_CERT") {
            self.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("AUTHGATE_TLS_KEY") {
            self.tls.key_path = Some(key);
        }
        Ok(())
    }

    fn ensure_secret(&mut self) {
        if self.session.secret.is_empty() {
            self.session.secret = authgate_core::token::random_token();
            tracing::warn!(
                "No session secret configured. Generated a random one; \
                 sessions will not survive a restart. Set AUTHGATE_SESSION_SECRET."
            );
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if WEAK_SECRETS
            .iter()
            .any(|w| self.session.secret.eq_ignore_ascii_case(w))
        {
            anyhow::bail!(
                "Session secret matches a known placeholder value. \
                 Generate one with `gen-secret` and set AUTHGATE_SESSION_SECRET."
            );
        }
        if self.session.secret.len() < 32 {
            tracing::warn!(
                "Session secret is shorter than 32 characters. \
                 Consider a stronger one via AUTHGATE_SESSION_SECRET."
            );
        }
        if self.session.ttl_seconds == 0 {
            anyhow::bail!("session.ttl_seconds must be greater than zero");
        }
        if self.session.ttl_seconds > MAX_SESSION_TTL_SECONDS {
            anyhow::bail!(
                "session.ttl_seconds must be at most {MAX_SESSION_TTL_SECONDS} (one day)"
            );
        }
        if self.rate_limit.login_max_attempts == 0 {
            anyhow::bail!("rate_limit.login_max_attempts must be greater than zero");
        }
        if self.rate_limit.login_window_seconds == 0 {
            anyhow::bail!("rate_limit.login_window_seconds must be greater than zero");
        }
        if self.rate_limit.login_window_seconds > MAX_LOGIN_WINDOW_SECONDS {
            anyhow::bail!(
                "rate_limit.login_window_seconds must be at most {MAX_LOGIN_WINDOW_SECONDS} (one week)"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.session.secret = secret.to_string();
        config
    }

    #[test]
    fn defaults_match_deployment() {
        let config = ServerConfig::default();
        assert_eq!(config.session_ttl(), Duration::from_secs(60));
        assert_eq!(config.rate_limit.login_max_attempts, 5);
        assert_eq!(config.login_window(), Duration::from_secs(900));
        assert_eq!(config.session.cookie_name, "authgate.sid");
        assert!(!config.debug.expose_users);
        assert!(!config.secure_cookie());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.bind_addr, default_bind_addr());
        assert_eq!(config.session.ttl_seconds, 60);
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config: ServerConfig = toml::from_str(
            r#"
            bind_addr = "0.0.0.0:8443"
            [session]
            ttl_seconds = 120
            [rate_limit]
            trust_forwarded_for = true
            [tls]
            cert_path = "cert.pem"
            key_path = "key.pem"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8443);
        assert_eq!(config.session.ttl_seconds, 120);
        assert_eq!(config.session.cookie_name, "authgate.sid");
        assert!(config.rate_limit.trust_forwarded_for);
        assert_eq!(config.rate_limit.login_max_attempts, 5);
        assert!(config.tls_enabled());
        assert!(config.secure_cookie());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(with_secret("contraseña").validate().is_err());
        assert!(with_secret("Secret").validate().is_err());
    }

    #[test]
    fn strong_secret_is_accepted() {
        assert!(with_secret(&authgate_core::token::random_token()).validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = with_secret(&authgate_core::token::random_token());
        config.session.ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = with_secret(&authgate_core::token::random_token());
        config.rate_limit.login_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let mut config = with_secret(&authgate_core::token::random_token());
        config.session.ttl_seconds = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = with_secret(&authgate_core::token::random_token());
        config.session.ttl_seconds = MAX_SESSION_TTL_SECONDS;
        assert!(config.validate().is_ok());

        let mut config = with_secret(&authgate_core::token::random_token());
        config.rate_limit.login_window_seconds = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = with_secret(&authgate_core::token::random_token());
        config.rate_limit.login_window_seconds = MAX_LOGIN_WINDOW_SECONDS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ensure_secret_fills_in_random_value() {
        let mut config = ServerConfig::default();
        config.ensure_secret();
        assert!(config.session.secret.len() >= 32);
    }
}
