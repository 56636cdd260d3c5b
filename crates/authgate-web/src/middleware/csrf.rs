use authgate_core::csrf::{verify_token, CSRF_FORM_FIELD, CSRF_HEADER};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::middleware::session::CurrentSession;

/// Upper bound on a buffered form body; the router-wide body limit is
/// smaller, so this only guards against misconfiguration.
const MAX_FORM_BYTES: usize = 1024 * 1024;

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rejects mutating requests whose `_csrf` form field (or `x-csrf-token`
/// header) does not belong to the current session. Safe methods pass
/// through untouched.
pub async fn csrf_guard(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let session = req
        .extensions()
        .get::<CurrentSession>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session middleware not installed".to_string()))?;
    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read request body: {e}")))?;

    let token = header_token.or_else(|| form_field(&bytes, CSRF_FORM_FIELD));
    if verify_token(&session.0, token.as_deref()).is_err() {
        tracing::warn!("CSRF check failed: {} {}", parts.method, parts.uri.path());
        return Err(AppError::InvalidToken);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
