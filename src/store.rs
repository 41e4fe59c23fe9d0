use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ConnectionConfig, LoginError, Preferences};

pub const CONFIG_KEY: &str = "wechatLoginConfig";
pub const PREFERENCES_KEY: &str = "wechatLoginSettings";

/// Synchronous string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, LoginError>;
    fn set(&self, key: &str, value: &str) -> Result<(), LoginError>;
    fn remove(&self, key: &str) -> Result<(), LoginError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, LoginError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LoginError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), LoginError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, LoginError> {
        let mut entries = self.entries.lock().map_err(|_| LoginError::Storage {
            key: key.to_string(),
            message: "memory store lock poisoned".to_string(),
        })?;
        Ok(f(&mut entries))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LoginError> {
        self.with_entries(key, |entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LoginError> {
        self.with_entries(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), LoginError> {
        self.with_entries(key, |entries| {
            entries.remove(key);
        })
    }
}

/// Keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LoginError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LoginError::Storage {
                key: key.to_string(),
                message: "key must be non-empty ascii alphanumerics, '_' or '-'".to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LoginError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LoginError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LoginError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub config: Option<ConnectionConfig>,
    pub preferences: Option<Preferences>,
}

/// Persists the connection form and the user's preferences.
#[derive(Debug, Clone)]
pub struct ConfigStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Never fails: anything unreadable loads as `None`.
    pub fn load(&self) -> StoredState {
        StoredState {
            config: self.read(CONFIG_KEY),
            preferences: self.read(PREFERENCES_KEY),
        }
    }

    pub fn save_config(&self, config: &ConnectionConfig) -> Result<(), LoginError> {
        self.write(CONFIG_KEY, config)
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), LoginError> {
        self.write(PREFERENCES_KEY, preferences)
    }

    /// Drops the stored connection config. Preferences are left alone.
    pub fn clear_config(&self) -> Result<(), LoginError> {
        self.store.remove(CONFIG_KEY)?;
        tracing::debug!(key = CONFIG_KEY, "cleared stored config");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring malformed stored value");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LoginError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)?;
        tracing::debug!(key, bytes = raw.len(), "saved value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, LoginError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), LoginError> {
            Err(LoginError::Storage {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            })
        }

        fn remove(&self, key: &str) -> Result<(), LoginError> {
            self.set(key, "")
        }
    }

    struct UnreadableStore;

    impl KeyValueStore for UnreadableStore {
        fn get(&self, key: &str) -> Result<Option<String>, LoginError> {
            Err(LoginError::Storage {
                key: key.to_string(),
                message: "backend offline".to_string(),
            })
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), LoginError> {
            Ok(())
        }

        fn remove(&self, _key: &str) -> Result<(), LoginError> {
            Ok(())
        }
    }

    fn sample_config() -> ConnectionConfig {
        ConnectionConfig::new("wx123", "https://example.com/cb")
            .with_app_secret("s3cr3t")
            .with_state("st")
    }

    #[test]
    fn load_from_empty_store_is_empty() {
        let store = ConfigStore::new(MemoryStore::new());
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn config_round_trips() {
        let store = ConfigStore::new(MemoryStore::new());
        let config = sample_config();
        store.save_config(&config).unwrap();
        assert_eq!(store.load().config, Some(config));
    }

    #[test]
    fn save_overwrites_previous_value() {
        let store = ConfigStore::new(MemoryStore::new());
        store.save_config(&sample_config()).unwrap();
        let updated = sample_config().with_state("other");
        store.save_config(&updated).unwrap();
        assert_eq!(store.load().config, Some(updated));
    }

    #[test]
    fn clear_config_keeps_preferences() {
        let store = ConfigStore::new(MemoryStore::new());
        let prefs = Preferences {
            theme_color: "blue".to_string(),
            auto_save: true,
        };
        store.save_config(&sample_config()).unwrap();
        store.save_preferences(&prefs).unwrap();

        store.clear_config().unwrap();

        let state = store.load();
        assert_eq!(state.config, None);
        assert_eq!(state.preferences, Some(prefs));
    }

    #[test]
    fn malformed_value_loads_as_absent() {
        let backend = MemoryStore::new();
        backend.set(CONFIG_KEY, "{not json").unwrap();
        backend.set(PREFERENCES_KEY, r#"{"autoSave":"yes"}"#).unwrap();

        let state = ConfigStore::new(&backend).load();
        assert_eq!(state, StoredState::default());
    }

    #[test]
    fn read_failures_load_as_absent() {
        let state = ConfigStore::new(UnreadableStore).load();
        assert_eq!(state, StoredState::default());
    }

    #[test]
    fn unreadable_config_file_loads_as_absent() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("wechatLoginConfig.json")).unwrap();
        let store = ConfigStore::new(FileStore::new(dir.path()));
        store.save_preferences(&Preferences::default()).unwrap();

        assert!(store.inner().get(CONFIG_KEY).is_err());
        let state = store.load();
        assert_eq!(state.config, None);
        assert_eq!(state.preferences, Some(Preferences::default()));
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("wechatLoginConfig.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupied"), "x").unwrap();

        let store = ConfigStore::new(FileStore::new(dir.path()));
        let err = store.save_config(&sample_config()).unwrap_err();
        assert!(err.is_storage(), "unexpected error: {err}");
        assert!(!dir.path().join("wechatLoginConfig.json.tmp").exists());
    }

    #[test]
    fn poisoned_memory_store_reports_storage_error() {
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            let result = scope
                .spawn(|| {
                    let _guard = store.entries.lock().unwrap();
                    panic!("poison the lock");
                })
                .join();
            assert!(result.is_err());
        });

        let err = store.get(CONFIG_KEY).unwrap_err();
        assert!(matches!(err, LoginError::Storage { ref key, .. } if key == CONFIG_KEY));
        assert!(store.set(CONFIG_KEY, "{}").unwrap_err().is_storage());
    }

    #[test]
    fn write_failures_are_surfaced() {
        let store = ConfigStore::new(ReadOnlyStore);
        let err = store.save_config(&sample_config()).unwrap_err();
        assert!(err.is_storage());
        assert!(store.save_preferences(&Preferences::default()).is_err());
        assert!(store.clear_config().unwrap_err().is_storage());
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(FileStore::new(dir.path().join("nested")));

        store.save_config(&sample_config()).unwrap();
        store.save_preferences(&Preferences::default()).unwrap();
        assert!(dir.path().join("nested/wechatLoginConfig.json").exists());

        let reopened = ConfigStore::new(FileStore::new(dir.path().join("nested")));
        assert_eq!(reopened.load().config, Some(sample_config()));

        reopened.clear_config().unwrap();
        reopened.clear_config().unwrap();
        let state = reopened.load();
        assert_eq!(state.config, None);
        assert_eq!(state.preferences, Some(Preferences::default()));
    }

    #[test]
    fn file_store_write_error_is_observable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let store = ConfigStore::new(FileStore::new(&blocker));
        let err = store.save_config(&sample_config()).unwrap_err();
        assert!(err.is_storage(), "unexpected error: {err}");
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.set("../escape", "x").unwrap_err().is_storage());
        assert!(store.get("").is_err());
    }
}
