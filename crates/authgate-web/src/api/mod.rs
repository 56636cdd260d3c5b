mod auth_handlers;
#[cfg(feature = "debug-endpoints")]
mod debug;
mod pages;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;

use crate::middleware::csrf::csrf_guard;
use crate::middleware::rate_limit::login_rate_limit;
use crate::middleware::session::session_layer;
use crate::state::AppState;

/// Login routes. The rate limiter wraps the CSRF guard, so a throttled
/// client is turned away before its token or credentials are looked at.
fn login_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth_handlers::login_form).post(auth_handlers::login),
        )
        .route_layer(from_fn(csrf_guard))
        .route_layer(from_fn_with_state(state.clone(), login_rate_limit))
}

fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route(
            "/register",
            get(auth_handlers::register_form).post(auth_handlers::register),
        )
        .route("/logout", get(auth_handlers::logout))
        .route("/buscar", get(pages::search))
        .route_layer(from_fn(csrf_guard))
}

#[cfg(feature = "debug-endpoints")]
fn with_debug_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    if !state.config.debug.expose_users {
        return router;
    }
    tracing::warn!("Debug endpoint /debug/users is enabled. Do not run this build in production.");
    router.merge(debug::router().route_layer(from_fn(csrf_guard)))
}

#[cfg(not(feature = "debug-endpoints"))]
fn with_debug_routes(router: Router<AppState>, _state: &AppState) -> Router<AppState> {
    router
}

/// Every session-aware route, wrapped in the session layer. `/healthz`
/// sits outside it and never creates a session.
pub fn router(state: AppState) -> Router {
    let app = with_debug_routes(pages_router().merge(login_router(&state)), &state);

    app.layer(from_fn_with_state(state.clone(), session_layer))
        .route("/healthz", get(pages::healthz))
        .with_state(state)
}
