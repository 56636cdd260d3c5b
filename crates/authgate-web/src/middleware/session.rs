use authgate_core::Session;
use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// The session resolved for the current request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

/// Attached to a response by handlers that replace or destroy the session,
/// so the cookie written on the way out points at the right id.
#[derive(Debug, Clone)]
pub enum SessionChange {
    Rotated(Session),
    Ended,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session middleware not installed".to_string()))
    }
}

/// Loads or creates the session for every request and refreshes the
/// session cookie on every response.
pub async fn session_layer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    let incoming = read_cookie(req.headers(), cookie_name);
    let (session, fresh) = state.sessions.start_or_resume(incoming.as_deref());
    if fresh && incoming.is_some() {
        tracing::debug!("Session cookie expired or invalid; issued a new session");
    }
    req.extensions_mut().insert(CurrentSession(session.clone()));

    let mut response = next.run(req).await;

    let set_cookie = match response.extensions_mut().remove::<SessionChange>() {
        Some(SessionChange::Ended) => clear_cookie(&state),
        Some(SessionChange::Rotated(rotated)) => session_cookie(&state, &rotated),
        None => session_cookie(&state, &session),
    };
    match HeaderValue::from_str(&set_cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Failed to encode session cookie: {e}"),
    }
    response
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn cookie_attributes(state: &AppState, max_age: u64) -> String {
    let secure = if state.config.secure_cookie() { "; Secure" } else { "" };
    format!("Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}{secure}")
}

fn session_cookie(state: &AppState, session: &Session) -> String {
    format!(
        "{}={}; {}",
        state.config.session.cookie_name,
        state.sessions.cookie_value(&session.id),
        cookie_attributes(state, state.sessions.remaining(session).as_secs())
    )
}

fn clear_cookie(state: &AppState) -> String {
    format!(
        "{}=; {}",
        state.config.session.cookie_name,
        cookie_attributes(state, 0)
    )
}
