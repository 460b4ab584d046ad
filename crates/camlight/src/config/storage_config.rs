use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preference storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Preference file location (None = platform data directory).
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}
