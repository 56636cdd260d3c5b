//! authgate core library — HTTP-agnostic authentication logic.
//!
//! `authgate-core` holds the shared state a login front end needs: who is
//! registered, which sessions are live, whether a form submission carries a
//! valid anti-forgery token, and how many login attempts a client has left.
//! It knows nothing about HTTP; the `authgate-web` binary wires it into axum.
//!
//! # Modules
//!
//! - [`credentials`] — [`CredentialStore`]: registration and credential checks.
//! - [`password`] — argon2 hashing and the password policy.
//! - [`session`] — [`SessionManager`]: fixed-lifetime sessions and signed cookie values.
//! - [`csrf`] — per-session anti-forgery tokens.
//! - [`rate_limit`] — [`LoginRateLimiter`]: fixed-window attempt counting.
//! - [`clock`] — injectable time source.
//! - [`error`] — unified error type ([`GateError`]) and result alias ([`GateResult`]).

pub mod clock;
pub mod credentials;
pub mod csrf;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialStore, NewUser, User};
pub use error::{GateError, GateResult};
pub use rate_limit::LoginRateLimiter;
pub use session::{Session, SessionManager};
