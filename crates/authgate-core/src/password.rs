//! Password hashing and the password policy.
//!
//! Hashes are argon2id PHC strings with a per-call random salt embedded in
//! the output. The policy is checked by the credential store before any
//! hashing happens; the hasher itself accepts any input.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{GateError, GateResult};

pub const MIN_PASSWORD_LEN: usize = 12;

pub fn hash_password(password: &str) -> GateResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GateError::Hash(format!("failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Verifies `password` against a stored PHC string.
///
/// The digest comparison inside argon2 is constant-time, so a mismatch in
/// the first byte costs the same as one in the last.
pub fn verify_password(hash: &str, password: &str) -> GateResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| GateError::Hash(format!("invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Checks that a password has at least 12 characters and at least one
/// uppercase letter, one lowercase letter, one digit and one symbol.
///
/// Anything that is not an ASCII letter or digit counts as a symbol,
/// underscore included.
pub fn check_password_policy(password: &str) -> GateResult<()> {
    let weak = |reason: &str| Err(GateError::WeakPassword(reason.to_string()));

    if password.chars().count() < MIN_PASSWORD_LEN {
        return weak("must be at least 12 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return weak("must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return weak("must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return weak("must contain a digit");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return weak("must contain a symbol");
    }
    Ok(())
}
