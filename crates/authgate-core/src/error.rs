//! Error types for `authgate-core`.
//!
//! All fallible operations in the core library return [`GateResult<T>`],
//! which is an alias for `Result<T, GateError>`.

use std::time::Duration;

/// Unified error type for all credential, session, CSRF and rate-limit
/// operations.
///
/// Each variant captures just enough context for the web layer to pick a
/// status code and an inline message.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A user with the requested username already exists.
    #[error("username already taken")]
    UsernameTaken,

    /// The password does not satisfy the password policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Unknown user or wrong password. Deliberately does not say which.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The client key exhausted its login attempts for the current window.
    #[error("too many login attempts, retry in {}s", retry_after.as_secs())]
    TooManyAttempts { retry_after: Duration },

    /// The submitted anti-forgery token is missing or does not belong to
    /// the active session.
    #[error("invalid CSRF token")]
    InvalidToken,

    /// The session is unknown or past its expiry.
    #[error("session expired")]
    SessionExpired,

    /// Lookup of a record that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed caller input (empty username, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The password hasher failed or a stored hash could not be parsed.
    #[error("password hash error: {0}")]
    Hash(String),
}

/// Convenience alias used throughout `authgate-core`.
pub type GateResult<T> = Result<T, GateError>;
