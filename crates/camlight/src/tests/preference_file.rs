use crate::FilePreferenceStore;

use camlight_core::{AUTO_MODE_KEY, CAMERA_DEVICE_KEY, KeyValueStore, Preferences};

/// WHAT: Values written by one store are read by a fresh one
/// WHY: Preferences must survive process restarts
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_values_when_reopening_then_values_restored() {
    // Given: A store in a not-yet-existing subdirectory
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("preferences.toml");
    let mut store = FilePreferenceStore::open(path.clone());

    // When: Saving both preferences and reopening
    Preferences::save_device(&mut store, "usb-0000:00:14.0-1").unwrap();
    Preferences::save_auto(&mut store, true).unwrap();
    let reopened = FilePreferenceStore::open(path);

    // Then: Both keys round-trip as strings
    assert_eq!(
        reopened.get(CAMERA_DEVICE_KEY).as_deref(),
        Some("usb-0000:00:14.0-1")
    );
    assert_eq!(reopened.get(AUTO_MODE_KEY).as_deref(), Some("true"));
}

/// WHAT: A malformed file reads as empty
/// WHY: Corrupt preferences apply defaults without surfacing an error
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_file_when_opening_then_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let store = FilePreferenceStore::open(path);

    assert_eq!(Preferences::load(&store), Preferences::default());
}

/// WHAT: A missing file reads as empty and is created on first write
/// WHY: First launch has no preferences yet
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_setting_then_file_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");
    let mut store = FilePreferenceStore::open(path.clone());
    assert!(store.get(AUTO_MODE_KEY).is_none());

    Preferences::save_auto(&mut store, false).unwrap();

    assert!(path.exists());
    assert!(!Preferences::load(&FilePreferenceStore::open(path)).auto_enabled);
}
