// Login attempts are counted per client key before the CSRF check and the
// credential check run, so a throttled client learns nothing about either.
//
// Configuration: `rate_limit.login_max_attempts` / `login_window_seconds`
// (default: 5 per 15 minutes). The key is the peer IP, or the first
// X-Forwarded-For hop when `trust_forwarded_for` is set.

use std::net::SocketAddr;

use authgate_core::{csrf, GateError};
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;
use crate::views;

pub const TOO_MANY_ATTEMPTS_MESSAGE: &str =
    "Too many login attempts. Please try again later.";

pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let key = client_key(&req, state.config.rate_limit.trust_forwarded_for);
    match state.login_limiter.check_and_record(&key) {
        Ok(_) => next.run(req).await,
        Err(GateError::TooManyAttempts { retry_after }) => {
            let token = req
                .extensions()
                .get::<CurrentSession>()
                .map(|s| csrf::issue_token(&s.0))
                .unwrap_or_default();
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                views::login_page(Some(TOO_MANY_ATTEMPTS_MESSAGE), &token),
            )
                .into_response();
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

pub fn client_key(req: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_from(addr: &str, forwarded: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/login");
        if let Some(f) = forwarded {
            builder = builder.header("x-forwarded-for", f);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn key_is_peer_ip_without_port() {
        let req = request_from("192.0.2.7:51234", None);
        assert_eq!(client_key(&req, false), "192.0.2.7");
    }

    #[test]
    fn forwarded_for_ignored_unless_trusted() {
        let req = request_from("10.0.0.1:4000", Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&req, false), "10.0.0.1");
        assert_eq!(client_key(&req, true), "203.0.113.9");
    }

    #[test]
    fn missing_connect_info_falls_back() {
        let req = Request::builder().uri("/login").body(Body::empty()).unwrap();
        assert_eq!(client_key(&req, false), "unknown");
    }
}
