//! Crash-safe file replacement.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tracing::debug;

/// Replace `path` with `contents` via a synced temp file and a rename.
///
/// Missing parent directories are created. A crash mid-write leaves the
/// previous file intact.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!(dir = ?dir, "Created directory");
        }
    }

    let temp_path = path.with_extension("toml.tmp");

    let mut temp_file = fs::File::create(&temp_path)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.sync_all()?;

    fs::rename(&temp_path, path)
}
