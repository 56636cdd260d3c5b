//! Server-side session table.
//!
//! A session lives for a fixed time measured from its creation; activity
//! does not extend it. Clients only ever hold the signed session id.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::error::{GateError, GateResult};
use crate::token::{random_token, sign, verify};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub username: Option<String>,
    pub created_at: Instant,
    pub expires_at: Instant,
    /// Generated once per session id; CSRF tokens are derived from it.
    pub csrf_secret: String,
    /// One-shot message shown on the next page render.
    pub flash: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

pub struct SessionManager {
    sessions: DashMap<String, Session>,
    ttl: Duration,
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self::with_clock(secret, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: impl Into<Vec<u8>>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            secret: secret.into(),
            clock,
        }
    }

    /// Resolves the incoming cookie to a live session, or starts a fresh
    /// anonymous one. The boolean is `true` when a new session was issued.
    pub fn start_or_resume(&self, cookie: Option<&str>) -> (Session, bool) {
        if let Some(session) = cookie
            .and_then(|value| self.unsign(value))
            .and_then(|id| self.get(&id))
        {
            return (session, false);
        }
        (self.create(), true)
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        let now = self.clock.now();
        let entry = self.sessions.get(session_id)?;
        if now >= entry.expires_at {
            drop(entry);
            self.sessions.remove_if(session_id, |_, s| now >= s.expires_at);
            tracing::debug!("Session expired: id={}", short(session_id));
            return None;
        }
        Some(entry.clone())
    }

    fn create(&self) -> Session {
        let now = self.clock.now();
        let session = Session {
            id: random_token(),
            username: None,
            created_at: now,
            expires_at: now + self.ttl,
            csrf_secret: random_token(),
            flash: None,
        };
        self.sessions.insert(session.id.clone(), session.clone());
        tracing::debug!(
            "Session created: id={}, store_size={}",
            short(&session.id),
            self.sessions.len()
        );
        session
    }

    /// Binds `username` to the session and moves it to a new id.
    ///
    /// The old id stops resolving immediately. The new id gets its own CSRF
    /// secret; expiry and any pending flash carry over.
    pub fn authenticate(&self, session_id: &str, username: &str) -> GateResult<Session> {
        let now = self.clock.now();
        let (_, old) = self
            .sessions
            .remove(session_id)
            .ok_or(GateError::SessionExpired)?;
        if now >= old.expires_at {
            return Err(GateError::SessionExpired);
        }

        let rotated = Session {
            id: random_token(),
            username: Some(username.to_string()),
            csrf_secret: random_token(),
            ..old
        };
        self.sessions.insert(rotated.id.clone(), rotated.clone());
        tracing::debug!(
            "Session authenticated: {} -> {}, user={username}",
            short(session_id),
            short(&rotated.id)
        );
        Ok(rotated)
    }

    /// Destroys the session. Returns whether it existed.
    pub fn end(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::debug!("Session ended: id={}", short(session_id));
        }
        removed
    }

    pub fn is_expired(&self, session: &Session) -> bool {
        self.clock.now() >= session.expires_at
    }

    /// Time until the session expires, zero if it already has.
    pub fn remaining(&self, session: &Session) -> Duration {
        session.expires_at.saturating_duration_since(self.clock.now())
    }

    pub fn set_flash(&self, session_id: &str, message: impl Into<String>) -> GateResult<()> {
        let now = self.clock.now();
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(GateError::SessionExpired)?;
        if now >= entry.expires_at {
            return Err(GateError::SessionExpired);
        }
        entry.flash = Some(message.into());
        Ok(())
    }

    pub fn take_flash(&self, session_id: &str) -> Option<String> {
        self.sessions.get_mut(session_id)?.flash.take()
    }

    /// Signed cookie value for a session id: `<id>.<hmac>`.
    pub fn cookie_value(&self, session_id: &str) -> String {
        format!("{session_id}.{}", sign(&self.secret, session_id.as_bytes()))
    }

    /// Inverse of [`cookie_value`](Self::cookie_value). Tampered or
    /// malformed values yield `None`.
    pub fn unsign(&self, value: &str) -> Option<String> {
        let (id, mac) = value.rsplit_once('.')?;
        if id.is_empty() || !verify(&self.secret, id.as_bytes(), mac) {
            return None;
        }
        Some(id.to_string())
    }

    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now < s.expires_at);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Log-safe prefix of a session id.
fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
