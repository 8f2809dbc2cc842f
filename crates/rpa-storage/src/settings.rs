//! Client preferences persisted next to the session keys.

use crate::{KeyValueStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Preferences that influence how requests are sent.
///
/// Fields written by other clients are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// `Some(false)` asks the backend not to record analytics for requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_tracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientSettings {
    /// Whether requests should carry the analytics opt-out header.
    pub fn analytics_disabled(&self) -> bool {
        self.usage_tracking == Some(false)
    }
}

/// Reads and writes [`ClientSettings`] under [`StorageKeys::SETTINGS`].
#[derive(Clone)]
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load settings; absent or malformed JSON yields `None`.
    pub fn load(&self) -> StorageResult<Option<ClientSettings>> {
        let Some(raw) = self.storage.get(StorageKeys::SETTINGS)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => Ok(Some(settings)),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed stored settings");
                Ok(None)
            }
        }
    }

    pub fn save(&self, settings: &ClientSettings) -> StorageResult<()> {
        let json =
            serde_json::to_string(settings).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::SETTINGS, &json)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SETTINGS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[test]
    fn test_settings_absent_by_default() {
        let store = SettingsStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_settings_roundtrip_uses_camel_case() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SettingsStore::new(storage.clone());

        store
            .save(&ClientSettings {
                usage_tracking: Some(false),
                ..Default::default()
            })
            .unwrap();

        let raw = storage.get(StorageKeys::SETTINGS).unwrap().unwrap();
        assert_eq!(raw, r#"{"usageTracking":false}"#);
        assert!(store.load().unwrap().unwrap().analytics_disabled());
    }

    #[test]
    fn test_settings_tolerate_foreign_fields() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                StorageKeys::SETTINGS,
                r#"{"compactMode":true,"usageTracking":true,"fontSize":"lg"}"#,
            )
            .unwrap();

        let settings = SettingsStore::new(storage).load().unwrap().unwrap();
        assert_eq!(settings.usage_tracking, Some(true));
        assert!(!settings.analytics_disabled());
    }

    #[test]
    fn test_save_keeps_foreign_fields() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                StorageKeys::SETTINGS,
                r#"{"compactMode":true,"usageTracking":true}"#,
            )
            .unwrap();
        let store = SettingsStore::new(storage.clone());

        let mut settings = store.load().unwrap().unwrap();
        settings.usage_tracking = Some(false);
        store.save(&settings).unwrap();

        let raw = storage.get(StorageKeys::SETTINGS).unwrap().unwrap();
        let saved: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            saved,
            serde_json::json!({ "compactMode": true, "usageTracking": false })
        );
    }

    #[test]
    fn test_malformed_settings_are_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKeys::SETTINGS, "nope").unwrap();

        assert_eq!(SettingsStore::new(storage).load().unwrap(), None);
    }
}
