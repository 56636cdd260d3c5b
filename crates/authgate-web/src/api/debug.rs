//! Development-only introspection. Compiled only with the `debug-endpoints`
//! feature and mounted only when `debug.expose_users` is set.

use authgate_core::User;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/debug/users", get(list_users))
}

/// Registered users without their password hashes.
async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.credentials.snapshot())
}
