//! User preferences that survive restarts.
//!
//! Values are stored as strings under two fixed keys. The boolean auto flag
//! is encoded as `"true"`/`"false"` and decoded by exact match against
//! `"true"`, so anything else reads as disabled.

use crate::CoreResult;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::{debug, instrument};

/// Key holding the last selected camera device id.
pub const CAMERA_DEVICE_KEY: &str = "camlight.cameraDeviceId";

/// Key holding the auto-send flag.
pub const AUTO_MODE_KEY: &str = "camlight.autoMode";

/// Durable string key-value storage.
pub trait KeyValueStore: Send {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> CoreResult<()>;
}

/// Process-local store. Clones share contents, which lets tests simulate a
/// restart by handing a clone to a fresh application.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Decoded preferences with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    /// Camera to open at startup. `None` means the platform default.
    pub selected_device_id: Option<String>,
    /// Whether auto-send starts enabled.
    pub auto_enabled: bool,
}

impl Preferences {
    /// Read both keys from `store`.
    #[instrument(skip(store))]
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let prefs = Self {
            selected_device_id: store.get(CAMERA_DEVICE_KEY).filter(|id| !id.is_empty()),
            auto_enabled: store.get(AUTO_MODE_KEY).as_deref() == Some("true"),
        };
        debug!(?prefs, "Preferences loaded");
        prefs
    }

    /// Persist the selected device id.
    pub fn save_device<S: KeyValueStore + ?Sized>(store: &mut S, device_id: &str) -> CoreResult<()> {
        store.set(CAMERA_DEVICE_KEY, device_id)
    }

    /// Persist the auto-send flag.
    pub fn save_auto<S: KeyValueStore + ?Sized>(store: &mut S, enabled: bool) -> CoreResult<()> {
        store.set(AUTO_MODE_KEY, if enabled { "true" } else { "false" })
    }
}
