//! Anti-forgery tokens bound to a session.
//!
//! A token is `<salt>.<hmac(csrf_secret, salt)>`. Every call to
//! [`issue_token`] yields a different string, and any of them verifies for
//! the session it was issued to and for no other.

use crate::error::{GateError, GateResult};
use crate::session::Session;
use crate::token::{random_token, sign, verify};

pub const CSRF_FORM_FIELD: &str = "_csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

pub fn issue_token(session: &Session) -> String {
    let salt = random_token();
    let mac = sign(session.csrf_secret.as_bytes(), salt.as_bytes());
    format!("{salt}.{mac}")
}

pub fn verify_token(session: &Session, submitted: Option<&str>) -> GateResult<()> {
    let (salt, mac) = submitted
        .and_then(|token| token.split_once('.'))
        .ok_or(GateError::InvalidToken)?;
    if salt.is_empty() || !verify(session.csrf_secret.as_bytes(), salt.as_bytes(), mac) {
        return Err(GateError::InvalidToken);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::SessionManager;

    fn two_sessions() -> (Session, Session) {
        let sessions = SessionManager::new("secret", Duration::from_secs(60));
        (sessions.start_or_resume(None).0, sessions.start_or_resume(None).0)
    }

    #[test]
    fn issued_token_verifies_for_its_session() {
        let (session, _) = two_sessions();
        let token = issue_token(&session);
        assert!(verify_token(&session, Some(&token)).is_ok());
    }

    #[test]
    fn tokens_are_salted_per_issue() {
        let (session, _) = two_sessions();
        let a = issue_token(&session);
        let b = issue_token(&session);
        assert_ne!(a, b);
        assert!(verify_token(&session, Some(&a)).is_ok());
        assert!(verify_token(&session, Some(&b)).is_ok());
    }

    #[test]
    fn token_from_another_session_is_rejected() {
        let (mine, theirs) = two_sessions();
        let token = issue_token(&theirs);
        assert!(matches!(
            verify_token(&mine, Some(&token)),
            Err(GateError::InvalidToken)
        ));
    }

    #[test]
    fn missing_or_malformed_token_is_rejected() {
        let (session, _) = two_sessions();
        for bad in [None, Some(""), Some("no-dot"), Some(".abc"), Some("abc.")] {
            assert!(
                matches!(verify_token(&session, bad), Err(GateError::InvalidToken)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let (session, _) = two_sessions();
        let token = issue_token(&session);
        let (salt, mac) = token.split_once('.').unwrap();
        let forged = format!("{salt}x.{mac}");
        assert!(verify_token(&session, Some(&forged)).is_err());
    }
}
