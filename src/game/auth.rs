//! Local account stub: a credential map in the key-value store plus a session token.
//!
//! Passwords are never stored; only an Argon2id PHC string is kept, and login
//! verifies the presented password against that digest.

use std::collections::BTreeMap;

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use log::{info, warn};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::storage::{KeyValueStore, SESSION_KEY, USERS_KEY};
use crate::game::types::UserProfile;
use crate::logutil::mask_email;
use crate::validation::{validate_display_name, validate_email, validate_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    profile: UserProfile,
    password_hash: String,
}

type UserTable = BTreeMap<String, StoredUser>;

pub struct AuthService<S: KeyValueStore> {
    store: S,
    argon2: Argon2<'static>,
}

impl<S: KeyValueStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            argon2: Argon2::default(),
        }
    }

    /// Use explicit Argon2id cost parameters (tests use tiny ones to stay fast).
    pub fn with_params(store: S, params: Option<Params>) -> Self {
        let argon2 = match params {
            Some(p) => Argon2::new(Algorithm::Argon2id, Version::V0x13, p),
            None => Argon2::default(),
        };
        Self { store, argon2 }
    }

    fn load_users(&self) -> Result<UserTable, GameError> {
        match self.store.get(USERS_KEY)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(UserTable::new()),
        }
    }

    fn save_users(&self, users: &UserTable) -> Result<(), GameError> {
        let blob = serde_json::to_string(users)?;
        self.store.set(USERS_KEY, &blob)
    }

    fn hash_password(&self, password: &str) -> Result<String, GameError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| GameError::Internal(format!("password hash failure: {e}")))?;
        Ok(hash.to_string())
    }

    /// Create an account and log it in. Fails if the email is already registered.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, GameError> {
        let email = validate_email(email).map_err(|e| GameError::Auth(e.to_string()))?;
        let name = validate_display_name(name).map_err(|e| GameError::Auth(e.to_string()))?;
        validate_password(password).map_err(|e| GameError::Auth(e.to_string()))?;

        let mut users = self.load_users()?;
        if users.contains_key(&email) {
            return Err(GameError::Auth(
                "Account already exists with this email.".to_string(),
            ));
        }

        let password_hash = self.hash_password(password)?;
        let mut profile = UserProfile::new(&format!("user-{}", now.timestamp_millis()), &name, now)
            .with_email(&email)
            .with_title("Awakened Soul");
        profile.avatar = "👤".to_string();

        users.insert(
            email.clone(),
            StoredUser {
                profile: profile.clone(),
                password_hash,
            },
        );
        self.save_users(&users)?;
        self.set_session(&email)?;
        info!(target: "security", "registered account {}", mask_email(&email));
        Ok(profile)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile, GameError> {
        let email = email.trim().to_ascii_lowercase();
        let users = self.load_users()?;
        let Some(user) = users.get(&email) else {
            warn!(target: "security", "login for unknown account {}", mask_email(&email));
            return Err(GameError::Auth("User not found.".to_string()));
        };

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| GameError::Internal(format!("corrupt password hash: {e}")))?;
        if self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            warn!(target: "security", "bad password for {}", mask_email(&email));
            return Err(GameError::Auth("Invalid password.".to_string()));
        }

        self.set_session(&email)?;
        Ok(user.profile.clone())
    }

    fn set_session(&self, email: &str) -> Result<(), GameError> {
        self.store.set(SESSION_KEY, email)
    }

    /// Profile of the logged-in account, if the token still points at one.
    pub fn get_session(&self) -> Result<Option<UserProfile>, GameError> {
        let Some(email) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        let users = self.load_users()?;
        Ok(users.get(&email).map(|user| user.profile.clone()))
    }

    pub fn logout(&self) -> Result<(), GameError> {
        self.store.remove(SESSION_KEY)
    }

    /// Mirror profile changes into the credential map, keeping the stored hash.
    /// Profiles without an email, or with an unregistered one, are ignored.
    pub fn update_user(&self, profile: &UserProfile) -> Result<(), GameError> {
        let Some(email) = profile.email.as_deref() else {
            return Ok(());
        };
        let mut users = self.load_users()?;
        let Some(existing) = users.get_mut(email) else {
            return Ok(());
        };
        existing.profile = profile.clone();
        self.save_users(&users)
    }
}
