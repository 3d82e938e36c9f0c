//! Identity and session management against the key-value store.
//!
//! Users live under [`StoreKey::Users`] with their password hash; the session
//! record under [`StoreKey::Session`] is the same user with the hash stripped.

use crate::error::{NexusError, Result};
use crate::store::{load_json, save_json, KeyValueStore, StoreKey};
use crate::team::{self, TeamMember, DEFAULT_SKILL};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const DEFAULT_ROLE: &str = "Product Manager";
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// Session-safe projection of a registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    #[serde(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn load_users(store: &dyn KeyValueStore) -> Result<Vec<UserRecord>> {
    Ok(load_json(store, &StoreKey::Users)?.unwrap_or_default())
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Put `key` back to its raw `prior` value, or remove it if it had none.
fn restore(store: &dyn KeyValueStore, key: &StoreKey, prior: Option<String>) {
    let res = match prior {
        Some(raw) => store.set(key, &raw),
        None => store.remove(key),
    };
    if let Err(e) = res {
        tracing::warn!("failed to roll back '{}': {e}", key.as_string());
    }
}

fn validate(reg: &Registration) -> Result<()> {
    if reg.name.trim().is_empty() {
        return Err(NexusError::validation("Name is required."));
    }
    if !email_re().is_match(reg.email.trim()) {
        return Err(NexusError::validation("Please enter a valid email address."));
    }
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(NexusError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Register a user, add a matching member to the global roster and sign in.
pub fn register(store: &dyn KeyValueStore, reg: Registration) -> Result<User> {
    validate(&reg)?;
    let mut users = load_users(store)?;
    let email = reg.email.trim().to_string();
    if users.iter().any(|u| same_email(&u.user.email, &email)) {
        return Err(NexusError::EmailTaken);
    }

    let name = reg.name.trim().to_string();
    let role = reg
        .role
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        avatar: team::default_avatar(&name),
        name,
        email,
        role,
    };
    users.push(UserRecord {
        user: user.clone(),
        password_hash: hash_password(&reg.password),
    });

    let mut roster: Vec<TeamMember> = load_json(store, &StoreKey::Team)?.unwrap_or_default();
    roster.push(TeamMember {
        id: user.id.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
        skills: vec![DEFAULT_SKILL.to_string()],
        avatar: user.avatar.clone(),
    });

    // All or nothing: a failed write leaves users and roster as they were.
    let prior_users = store.get(&StoreKey::Users)?;
    let prior_team = store.get(&StoreKey::Team)?;
    let written = save_json(store, &StoreKey::Users, &users)
        .and_then(|()| save_json(store, &StoreKey::Team, &roster))
        .and_then(|()| login(store, &user.email, &reg.password));
    match written {
        Ok(user) => {
            tracing::info!("registered {}", user.email);
            Ok(user)
        }
        Err(e) => {
            restore(store, &StoreKey::Team, prior_team);
            restore(store, &StoreKey::Users, prior_users);
            Err(e)
        }
    }
}

pub fn login(store: &dyn KeyValueStore, email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    let hash = hash_password(password);
    let user = load_users(store)?
        .into_iter()
        .find(|u| same_email(&u.user.email, email) && u.password_hash == hash)
        .map(|u| u.user)
        .ok_or(NexusError::InvalidCredentials)?;
    save_json(store, &StoreKey::Session, &user)?;
    tracing::info!("signed in as {}", user.email);
    Ok(user)
}

/// Clear the session pointer. Everything else stays.
pub fn logout(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(&StoreKey::Session)?;
    tracing::info!("signed out");
    Ok(())
}

/// The signed-in user, if any. An unreadable session counts as signed out.
pub fn current_user(store: &dyn KeyValueStore) -> Option<User> {
    match load_json(store, &StoreKey::Session) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("ignoring unreadable session: {e}");
            None
        }
    }
}

pub fn require_user(store: &dyn KeyValueStore) -> Result<User> {
    current_user(store).ok_or(NexusError::NotSignedIn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn reg(email: &str) -> Registration {
        Registration {
            name: "Ada Lovelace".into(),
            email: email.into(),
            password: "secret1".into(),
            role: None,
        }
    }

    #[test]
    fn register_signs_in_and_adds_member() {
        let store = MemoryStore::new();
        let user = register(&store, reg("ada@example.com")).unwrap();
        assert_eq!(user.role, DEFAULT_ROLE);
        assert_eq!(current_user(&store), Some(user.clone()));

        let roster: Vec<TeamMember> = load_json(&store, &StoreKey::Team).unwrap().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, user.id);
        assert_eq!(roster[0].skills, vec!["General"]);
    }

    #[test]
    fn session_never_holds_hash() {
        let store = MemoryStore::new();
        register(&store, reg("ada@example.com")).unwrap();
        let raw = store.get(&StoreKey::Session).unwrap().unwrap();
        assert!(!raw.contains("password_hash"));
        let users = store.get(&StoreKey::Users).unwrap().unwrap();
        assert!(users.contains(&hash_password("secret1")));
    }

    #[test]
    fn duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        register(&store, reg("ada@example.com")).unwrap();
        let err = register(&store, reg("ADA@Example.com"));
        assert!(matches!(err, Err(NexusError::EmailTaken)));

        let users: Vec<UserRecord> = load_users(&store).unwrap();
        assert_eq!(users.len(), 1);
        let roster: Vec<TeamMember> = load_json(&store, &StoreKey::Team).unwrap().unwrap();
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn validation_errors() {
        let store = MemoryStore::new();
        let mut short = reg("ada@example.com");
        short.password = "12345".into();
        let err = register(&store, short).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters.");

        assert!(matches!(
            register(&store, reg("not-an-email")),
            Err(NexusError::Validation(_))
        ));
        assert!(load_users(&store).unwrap().is_empty());
    }

    #[test]
    fn login_checks_password() {
        let store = MemoryStore::new();
        register(&store, reg("ada@example.com")).unwrap();
        logout(&store).unwrap();
        assert!(current_user(&store).is_none());

        assert!(matches!(
            login(&store, "ada@example.com", "wrong!"),
            Err(NexusError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "nobody@example.com", "secret1"),
            Err(NexusError::InvalidCredentials)
        ));
        let user = login(&store, "Ada@Example.com", "secret1").unwrap();
        assert_eq!(user.name, "Ada Lovelace");
    }

    #[test]
    fn failed_registration_leaves_nothing_behind() {
        // Size the quota so the users document fits but the roster does not.
        let sizing = MemoryStore::new();
        register(&sizing, reg("ada@example.com")).unwrap();
        let users_len = sizing.get(&StoreKey::Users).unwrap().unwrap().len();
        let quota = StoreKey::Users.as_string().len() + users_len + 8;

        let store = MemoryStore::with_quota(quota);
        let err = register(&store, reg("ada@example.com")).unwrap_err();
        assert!(matches!(err, NexusError::QuotaExceeded(_)));
        assert!(store.get(&StoreKey::Users).unwrap().is_none());
        assert!(store.get(&StoreKey::Team).unwrap().is_none());
        assert!(current_user(&store).is_none());

        // Nothing stuck around to trip the duplicate check.
        let roomy = MemoryStore::new();
        register(&roomy, reg("ada@example.com")).unwrap();
        assert!(matches!(
            register(&roomy, reg("ada@example.com")),
            Err(NexusError::EmailTaken)
        ));
    }

    #[test]
    fn email_match_folds_non_ascii_case() {
        let store = MemoryStore::new();
        register(&store, reg("émile@example.com")).unwrap();
        assert!(matches!(
            register(&store, reg("ÉMILE@example.com")),
            Err(NexusError::EmailTaken)
        ));
        logout(&store).unwrap();
        let user = login(&store, "Émile@Example.com", "secret1").unwrap();
        assert_eq!(user.email, "émile@example.com");
    }

    #[test]
    fn logout_keeps_data() {
        let store = MemoryStore::new();
        register(&store, reg("ada@example.com")).unwrap();
        logout(&store).unwrap();
        assert!(matches!(require_user(&store), Err(NexusError::NotSignedIn)));
        assert!(store.get(&StoreKey::Team).unwrap().is_some());
        assert!(store.get(&StoreKey::Users).unwrap().is_some());
    }
}
