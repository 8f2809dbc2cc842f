//! Token, profile and refresh-token persistence for one surface.

use crate::{KeyValueStorage, StorageError, StorageResult, TokenKeys};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Durable home of one surface's session credentials.
///
/// This is the only owner of the token: callers read it at the moment they
/// need it and never keep their own copy as a source of truth. No validation
/// happens here.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    keys: TokenKeys,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").field("keys", &self.keys).finish()
    }
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, keys: TokenKeys) -> Self {
        Self { storage, keys }
    }

    pub fn keys(&self) -> TokenKeys {
        self.keys
    }

    /// The backend shared with other stores (e.g. settings).
    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::clone(&self.storage)
    }

    // ==========================================
    // Access token
    // ==========================================

    pub fn set_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(self.keys.token, token)
    }

    pub fn get_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(self.keys.token)
    }

    pub fn clear_token(&self) -> StorageResult<()> {
        self.storage.delete(self.keys.token)?;
        Ok(())
    }

    // ==========================================
    // Profile
    // ==========================================

    pub fn set_profile<T: Serialize>(&self, profile: &T) -> StorageResult<()> {
        let json =
            serde_json::to_string(profile).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(self.keys.profile, &json)
    }

    /// Read the stored profile.
    ///
    /// Malformed JSON is treated as "no profile" rather than an error.
    pub fn get_profile<T: DeserializeOwned>(&self) -> StorageResult<Option<T>> {
        let Some(raw) = self.storage.get(self.keys.profile)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                debug!(key = self.keys.profile, error = %e, "Ignoring malformed stored profile");
                Ok(None)
            }
        }
    }

    pub fn clear_profile(&self) -> StorageResult<()> {
        self.storage.delete(self.keys.profile)?;
        Ok(())
    }

    // ==========================================
    // Refresh token
    // ==========================================

    /// Store a refresh token. A no-op on surfaces without a refresh key.
    pub fn set_refresh_token(&self, token: &str) -> StorageResult<()> {
        match self.keys.refresh {
            Some(key) => self.storage.set(key, token),
            None => Ok(()),
        }
    }

    pub fn get_refresh_token(&self) -> StorageResult<Option<String>> {
        match self.keys.refresh {
            Some(key) => self.storage.get(key),
            None => Ok(None),
        }
    }

    pub fn clear_refresh_token(&self) -> StorageResult<()> {
        if let Some(key) = self.keys.refresh {
            self.storage.delete(key)?;
        }
        Ok(())
    }

    /// Remove everything this surface stored.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.clear_token()?;
        self.clear_refresh_token()?;
        self.clear_profile()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, StorageKeys};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestProfile {
        id: String,
        email: Option<String>,
    }

    fn user_store() -> (Arc<MemoryStorage>, TokenStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = TokenStore::new(storage.clone(), TokenKeys::user());
        (storage, store)
    }

    #[test]
    fn test_token_roundtrip() {
        let (_, store) = user_store();

        assert_eq!(store.get_token().unwrap(), None);
        store.set_token("a.b.c").unwrap();
        assert_eq!(store.get_token().unwrap(), Some("a.b.c".to_string()));
        store.clear_token().unwrap();
        assert_eq!(store.get_token().unwrap(), None);
    }

    #[test]
    fn test_profile_roundtrip() {
        let (_, store) = user_store();
        let profile = TestProfile {
            id: "u-1".to_string(),
            email: Some("a@b.c".to_string()),
        };

        store.set_profile(&profile).unwrap();
        assert_eq!(store.get_profile::<TestProfile>().unwrap(), Some(profile));
    }

    #[test]
    fn test_malformed_profile_is_absent() {
        let (storage, store) = user_store();
        storage.set(StorageKeys::USER_PROFILE, "{not json").unwrap();

        assert_eq!(store.get_profile::<TestProfile>().unwrap(), None);
    }

    #[test]
    fn test_clear_all_removes_everything_for_surface_only() {
        let storage = Arc::new(MemoryStorage::new());
        let user = TokenStore::new(storage.clone(), TokenKeys::user());
        let admin = TokenStore::new(storage.clone(), TokenKeys::admin());

        user.set_token("user.token.sig").unwrap();
        user.set_refresh_token("refresh").unwrap();
        user.set_profile(&serde_json::json!({"id": "u"})).unwrap();
        admin.set_token("admin.token.sig").unwrap();

        user.clear_all().unwrap();

        assert_eq!(user.get_token().unwrap(), None);
        assert_eq!(user.get_refresh_token().unwrap(), None);
        assert_eq!(user.get_profile::<serde_json::Value>().unwrap(), None);
        assert_eq!(
            admin.get_token().unwrap(),
            Some("admin.token.sig".to_string())
        );
    }

    #[test]
    fn test_refresh_token_noop_without_key() {
        let storage = Arc::new(MemoryStorage::new());
        let admin = TokenStore::new(storage.clone(), TokenKeys::admin());

        admin.set_refresh_token("ignored").unwrap();
        assert_eq!(admin.get_refresh_token().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let (storage, store) = user_store();
        store.set_token("t").unwrap();

        store.clear_all().unwrap();
        store.clear_all().unwrap();

        assert!(storage.is_empty());
    }
}
