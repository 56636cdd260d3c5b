//! In-memory credential store.
//!
//! Users are keyed by exact (case-sensitive) username and are never mutated
//! or removed once registered. All methods are blocking: password hashing is
//! deliberately slow, so async callers should run them on a blocking pool.

use std::sync::OnceLock;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::error::{GateError, GateResult};
use crate::password::{check_password_policy, hash_password, verify_password};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub age: u32,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub age: u32,
    pub password: String,
}

#[derive(Default)]
pub struct CredentialStore {
    users: DashMap<String, User>,
    dummy_hash: OnceLock<Option<String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user.
    ///
    /// Uniqueness is checked before the password policy so a taken name is
    /// reported even when the password is also weak. The final insert goes
    /// through the map entry, so of two concurrent registrations for the same
    /// name exactly one succeeds.
    pub fn register(&self, new_user: NewUser) -> GateResult<User> {
        let NewUser {
            username,
            email,
            age,
            password,
        } = new_user;

        if username.is_empty() {
            return Err(GateError::InvalidInput("username must not be empty".to_string()));
        }
        if self.users.contains_key(&username) {
            return Err(GateError::UsernameTaken);
        }
        check_password_policy(&password)?;

        let password_hash = hash_password(&password)?;
        let user = User {
            username: username.clone(),
            password_hash,
            email,
            age,
        };

        match self.users.entry(username) {
            Entry::Occupied(_) => Err(GateError::UsernameTaken),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                tracing::info!("User registered: {}", user.username);
                Ok(user)
            }
        }
    }

    pub fn lookup(&self, username: &str) -> GateResult<User> {
        self.users
            .get(username)
            .map(|entry| entry.clone())
            .ok_or_else(|| GateError::NotFound(username.to_string()))
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users still pay for one hash verification so response timing
    /// does not reveal which usernames exist.
    pub fn verify_credentials(&self, username: &str, password: &str) -> GateResult<User> {
        let user = match self.lookup(username) {
            Ok(user) => user,
            Err(_) => {
                if let Some(dummy) = self.dummy_hash() {
                    let _ = verify_password(dummy, password);
                }
                return Err(GateError::InvalidCredentials);
            }
        };

        if verify_password(&user.password_hash, password)? {
            Ok(user)
        } else {
            Err(GateError::InvalidCredentials)
        }
    }

    /// All users, sorted by username.
    pub fn snapshot(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn dummy_hash(&self) -> Option<&str> {
        self.dummy_hash
            .get_or_init(|| hash_password("authgate-timing-equalizer").ok())
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn alice(password: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            age: 30,
            password: password.to_string(),
        }
    }

    #[test]
    fn register_then_lookup() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let user = store.lookup("alice").unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.age, 30);
        assert!(!user.password_hash.is_empty());
        assert_ne!(user.password_hash, "Str0ng!Passw0rd");
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let err = store.register(alice("An0ther!Passw0rd")).unwrap_err();
        assert!(matches!(err, GateError::UsernameTaken));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let mut upper = alice("Str0ng!Passw0rd");
        upper.username = "Alice".to_string();
        assert!(store.register(upper).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn taken_is_reported_before_weak() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let err = store.register(alice("weakpass")).unwrap_err();
        assert!(matches!(err, GateError::UsernameTaken));
    }

    #[test]
    fn weak_password_is_not_stored() {
        let store = CredentialStore::new();
        let err = store.register(alice("weakpass")).unwrap_err();
        assert!(matches!(err, GateError::WeakPassword(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_username_is_invalid() {
        let store = CredentialStore::new();
        let mut user = alice("Str0ng!Passw0rd");
        user.username.clear();
        assert!(matches!(
            store.register(user).unwrap_err(),
            GateError::InvalidInput(_)
        ));
    }

    #[test]
    fn lookup_missing_user() {
        let store = CredentialStore::new();
        assert!(matches!(
            store.lookup("nobody").unwrap_err(),
            GateError::NotFound(_)
        ));
    }

    #[test]
    fn verify_credentials_accepts_correct_password() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let user = store.verify_credentials("alice", "Str0ng!Passw0rd").unwrap();
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let store = CredentialStore::new();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let wrong = store.verify_credentials("alice", "Wr0ng!Passw0rd").unwrap_err();
        let unknown = store.verify_credentials("bob", "Str0ng!Passw0rd").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, GateError::InvalidCredentials));
        assert!(matches!(unknown, GateError::InvalidCredentials));
    }

    #[test]
    fn concurrent_registration_of_same_name_has_one_winner() {
        let store = Arc::new(CredentialStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.register(alice("Str0ng!Passw0rd")).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted_and_omits_hashes_when_serialized() {
        let store = CredentialStore::new();
        let mut bob = alice("Str0ng!Passw0rd");
        bob.username = "bob".to_string();
        store.register(bob).unwrap();
        store.register(alice("Str0ng!Passw0rd")).unwrap();

        let users = store.snapshot();
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[1].username, "bob");

        let json = serde_json::to_string(&users).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$argon2"));
    }
}
