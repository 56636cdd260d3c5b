use serde::Deserialize;

// The `_csrf` field is consumed by the CSRF middleware; serde ignores it here.

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    /// Kept as text so a non-numeric age re-renders the form instead of
    /// failing extraction.
    pub age: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}
