//! Process-wide settings store with default filling
//!
//! The store is a flat map of slash-separated keys persisted as YAML. It can
//! only be obtained through [`GlobalSettings::initialize`], which loads the
//! file and fills in defaults before handing out the handle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const KEY_VIEW_ZOOM_TO_FIT_DURING_ACQ: &str = "view/zoom_to_fit_during_acq";
pub const KEY_VIEW_COLOURED_BG: &str = "view/coloured_bg";
pub const KEY_VIEW_STICKY_SCROLLING: &str = "view/sticky_scrolling";
pub const KEY_VIEW_SHOW_SAMPLING_POINTS: &str = "view/show_sampling_points";
pub const KEY_VIEW_DEFAULT_DIV_HEIGHT: &str = "view/default_div_height";
pub const KEY_DEC_INITIAL_STATE_CONFIGURABLE: &str = "decode/initial_state_configurable";
pub const KEY_LOG_BUFFER_SIZE: &str = "log/buffer_size";
pub const KEY_LOG_NOTIFY_OF_STACKTRACE: &str = "log/notify_of_stacktrace";
pub const KEY_SESSIONS_SAVED: &str = "sessions/saved";

/// Name of the on-disk format, reported at spew verbosity
pub const SETTINGS_FORMAT: &str = "yaml";

/// A stored setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Int(i)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(l: Vec<String>) -> Self {
        SettingValue::List(l)
    }
}

/// Defaults written wherever a key is absent
fn defaults() -> Vec<(&'static str, SettingValue)> {
    vec![
        (KEY_VIEW_ZOOM_TO_FIT_DURING_ACQ, true.into()),
        (KEY_VIEW_COLOURED_BG, true.into()),
        (KEY_VIEW_STICKY_SCROLLING, false.into()),
        (KEY_VIEW_SHOW_SAMPLING_POINTS, true.into()),
        (KEY_VIEW_DEFAULT_DIV_HEIGHT, 80i64.into()),
        (KEY_DEC_INITIAL_STATE_CONFIGURABLE, false.into()),
        (KEY_LOG_BUFFER_SIZE, 1000i64.into()),
        (KEY_LOG_NOTIFY_OF_STACKTRACE, true.into()),
        (KEY_SESSIONS_SAVED, Vec::<String>::new().into()),
    ]
}

/// Default location of the settings file
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(crate::BIN_NAME).join("settings.yaml"))
}

#[derive(Debug, Default)]
struct Store {
    values: BTreeMap<String, SettingValue>,
}

/// Shared handle to the settings store
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    store: Arc<RwLock<Store>>,
    path: Option<PathBuf>,
    /// Set when the file could not be loaded; it is then never overwritten
    read_only: bool,
}

impl GlobalSettings {
    /// Load the store from `path` (if any) and fill defaults where needed
    ///
    /// Never fails: a missing file starts empty, an unreadable one is
    /// reported in the returned error slot and replaced by defaults. In that
    /// case the store is not written back, so the file stays as it was.
    pub fn initialize(path: Option<PathBuf>) -> (Self, Option<SettingsError>) {
        let (values, error) = match &path {
            Some(p) if p.exists() => match Self::read_file(p) {
                Ok(values) => (values, None),
                Err(e) => (BTreeMap::new(), Some(e)),
            },
            _ => (BTreeMap::new(), None),
        };

        let settings = Self {
            store: Arc::new(RwLock::new(Store { values })),
            path,
            read_only: error.is_some(),
        };
        settings.set_defaults_where_needed();
        (settings, error)
    }

    /// In-memory store with defaults, never persisted
    pub fn in_memory() -> Self {
        Self::initialize(None).0
    }

    fn read_file(path: &Path) -> Result<BTreeMap<String, SettingValue>, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert every default whose key is absent; existing values are kept
    pub fn set_defaults_where_needed(&self) {
        let mut store = self.write();
        for (key, value) in defaults() {
            store.values.entry(key.to_string()).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.read().values.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_ref().and_then(SettingValue::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).as_ref().and_then(SettingValue::as_int)
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.read()
            .values
            .get(key)
            .and_then(SettingValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.write().values.insert(key.into(), value.into());
    }

    /// File backing this store, if persisted
    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the store back to its file; a no-op for stores that failed to load
    pub fn sync(&self) -> Result<(), SettingsError> {
        let Some(path) = self.path.as_ref().filter(|_| !self.read_only) else {
            return Ok(());
        };

        let yaml = serde_yaml::to_string(&self.read().values).map_err(|e| SettingsError::Parse {
            path: path.clone(),
            source: e,
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, yaml).map_err(|e| SettingsError::Io {
            path: path.clone(),
            source: e,
        })
    }
}

/// Settings store errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_filled_on_initialize() {
        let settings = GlobalSettings::in_memory();
        assert_eq!(settings.get_int(KEY_LOG_BUFFER_SIZE), Some(1000));
        assert_eq!(settings.get_bool(KEY_LOG_NOTIFY_OF_STACKTRACE), Some(true));
        assert!(settings.get_list(KEY_SESSIONS_SAVED).is_empty());
        assert!(settings.file_path().is_none());
    }

    #[test]
    fn test_defaults_do_not_overwrite_existing() {
        let settings = GlobalSettings::in_memory();
        settings.set(KEY_LOG_BUFFER_SIZE, 50i64);
        settings.set_defaults_where_needed();
        assert_eq!(settings.get_int(KEY_LOG_BUFFER_SIZE), Some(50));
    }

    #[test]
    fn test_sync_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");

        let (settings, error) = GlobalSettings::initialize(Some(path.clone()));
        assert!(error.is_none());
        settings.set(KEY_VIEW_STICKY_SCROLLING, true);
        settings.set(KEY_SESSIONS_SAVED, vec!["a.sr".to_string(), "b.sr".to_string()]);
        settings.sync().unwrap();

        let (reloaded, error) = GlobalSettings::initialize(Some(path));
        assert!(error.is_none());
        assert_eq!(reloaded.get_bool(KEY_VIEW_STICKY_SCROLLING), Some(true));
        assert_eq!(reloaded.get_list(KEY_SESSIONS_SAVED), vec!["a.sr", "b.sr"]);
        assert_eq!(reloaded.get_int(KEY_VIEW_DEFAULT_DIV_HEIGHT), Some(80));
    }

    #[test]
    fn test_partial_file_gets_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "log/buffer_size: 20\n").unwrap();

        let (settings, error) = GlobalSettings::initialize(Some(path));
        assert!(error.is_none());
        assert_eq!(settings.get_int(KEY_LOG_BUFFER_SIZE), Some(20));
        assert_eq!(settings.get_bool(KEY_VIEW_COLOURED_BG), Some(true));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "- not\n- a map\n").unwrap();

        let (settings, error) = GlobalSettings::initialize(Some(path));
        assert!(matches!(error, Some(SettingsError::Parse { .. })));
        assert_eq!(settings.get_int(KEY_LOG_BUFFER_SIZE), Some(1000));
    }

    #[test]
    fn test_malformed_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let original = "view/coloured_bg: false\nsessions/saved: [a.sr\n";
        std::fs::write(&path, original).unwrap();

        let (settings, error) = GlobalSettings::initialize(Some(path.clone()));
        assert!(matches!(error, Some(SettingsError::Parse { .. })));
        settings.set(KEY_SESSIONS_SAVED, vec!["Session 1".to_string()]);
        settings.sync().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_clones_share_the_store() {
        let settings = GlobalSettings::in_memory();
        let other = settings.clone();
        other.set("custom/key", "value");
        assert_eq!(
            settings.get("custom/key"),
            Some(SettingValue::String("value".to_string()))
        );
    }
}
