use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::game::errors::GameError;
use crate::game::types::{UserProfile, PROFILE_SCHEMA_VERSION};

/// Key under which the active profile blob is stored.
pub const PROFILE_KEY: &str = "sidequest_user";
/// Key holding the serialized credential map (email -> stored user).
pub const USERS_KEY: &str = "sidequest_users_db_v1";
/// Key holding the email of the logged-in account.
pub const SESSION_KEY: &str = "sidequest_session_token";

const TREE_PRIMARY: &str = "sidequest";

/// Synchronous string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, GameError>;
    fn set(&self, key: &str, value: &str) -> Result<(), GameError>;
    fn remove(&self, key: &str) -> Result<(), GameError>;
}

/// Sled-backed persistence for the profile blob, credentials and session token.
/// Every write is flushed before returning.
#[derive(Clone)]
pub struct SledStore {
    _db: sled::Db,
    primary: sled::Tree,
}

impl SledStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        Ok(Self { _db: db, primary })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        let Some(bytes) = self.primary.get(key.as_bytes())? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| GameError::Internal(format!("non-utf8 value under {}: {}", key, e)))?;
        Ok(Some(text.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
        self.primary.insert(key.as_bytes(), value.as_bytes())?;
        self.primary.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), GameError> {
        self.primary.remove(key.as_bytes())?;
        self.primary.flush()?;
        Ok(())
    }
}

/// In-process store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, GameError> {
        self.entries
            .lock()
            .map_err(|_| GameError::Internal("memory store poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), GameError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Serialize a profile to the exact blob written to the store.
pub fn serialize_profile(profile: &UserProfile) -> Result<String, GameError> {
    Ok(serde_json::to_string(profile)?)
}

/// Fetch the persisted profile, if any.
pub fn load_profile<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<UserProfile>, GameError> {
    let Some(blob) = store.get(PROFILE_KEY)? else {
        return Ok(None);
    };
    let profile: UserProfile = serde_json::from_str(&blob)?;
    if profile.schema_version != PROFILE_SCHEMA_VERSION {
        return Err(GameError::SchemaMismatch {
            entity: "profile",
            expected: PROFILE_SCHEMA_VERSION,
            found: profile.schema_version,
        });
    }
    Ok(Some(profile))
}

/// Persist the profile blob under [`PROFILE_KEY`].
pub fn save_profile<S: KeyValueStore + ?Sized>(store: &S, profile: &UserProfile) -> Result<(), GameError> {
    let blob = serialize_profile(profile)?;
    store.set(PROFILE_KEY, &blob)
}
