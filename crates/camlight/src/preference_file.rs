//! File-backed preference store.
//!
//! Preferences live in a flat TOML table of strings. The whole table is
//! rewritten atomically on every change. A missing, unreadable or malformed
//! file reads as empty so defaults apply.

use crate::atomic_file::write_atomic;

use camlight_core::{CoreError, CoreResult, KeyValueStore};

use std::{collections::BTreeMap, fs, panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Durable preference storage on the local filesystem.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    /// Open the store at `path`, reading any existing values.
    #[instrument]
    pub fn open(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(values) => {
                    debug!(path = ?path, entries = values.len(), "Preferences read");
                    values
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Malformed preference file, using defaults");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = ?path, error = %e, "Unreadable preference file, using defaults");
                BTreeMap::new()
            }
        };

        Self { path, values }
    }

    /// File the store writes to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[track_caller]
    fn persist(&self) -> CoreResult<()> {
        let contents = toml::to_string(&self.values).map_err(|e| CoreError::Storage {
            reason: format!("Failed to serialize preferences: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        write_atomic(&self.path, &contents).map_err(|e| CoreError::Storage {
            reason: format!("Failed to write preferences {}: {}", self.path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(path = ?self.path, "Preferences saved");

        Ok(())
    }
}

impl KeyValueStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}
