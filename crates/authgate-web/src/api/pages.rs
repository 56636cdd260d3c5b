use axum::extract::{Query, State};
use axum::response::Html;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::dto::SearchQuery;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;
use crate::views;

pub async fn index(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Html<String> {
    let flash = state.sessions.take_flash(&session.id);
    views::index_page(session.username.as_deref(), flash.as_deref())
}

/// Characters left as-is when echoing a query: alphanumerics plus
/// `- _ . ! ~ * ' ( )`, the same set browsers' `encodeURIComponent` keeps.
const QUERY_ECHO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Echoes the query back percent-encoded, so nothing the caller sends is
/// ever interpreted as markup.
pub async fn search(Query(params): Query<SearchQuery>) -> String {
    let query = params.query.unwrap_or_default();
    format!(
        "Searching results for: {}",
        utf8_percent_encode(&query, QUERY_ECHO)
    )
}

pub async fn healthz() -> &'static str {
    "ok"
}
