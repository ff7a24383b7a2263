//! Binary artifact caches (street widths, neighborhood distances, scorer
//! weights).
//!
//! Every cache is load-if-present, else compute-and-persist. A cache that
//! is missing or fails to decode is rebuilt; a cache that cannot be written
//! is logged and the freshly built value is still returned. There is no
//! partial invalidation: delete the file to force a rebuild.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bitcode::{DecodeOwned, Encode};
use tracing::{debug, info, warn};

use crate::error::PlannerError;

/// Reads and decodes a cached value, returning `None` when absent or corrupt.
pub fn load<T: DecodeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "cache not present");
            return None;
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache unreadable, rebuilding");
            return None;
        }
    };

    match bitcode::decode::<T>(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache corrupt, rebuilding");
            None
        }
    }
}

/// Encodes `value` and writes it atomically to `path`.
pub fn store<T: Encode>(path: &Path, value: &T) -> io::Result<()> {
    atomic_write(path, &bitcode::encode(value))
}

/// Returns the cached value at `path`, or builds and persists a fresh one.
pub fn load_or_build<T, F>(path: &Path, build: F) -> Result<T, PlannerError>
where
    T: Encode + DecodeOwned,
    F: FnOnce() -> Result<T, PlannerError>,
{
    if let Some(value) = load(path) {
        info!(path = %path.display(), "loaded cache");
        return Ok(value);
    }

    let value = build()?;
    match store(path, &value) {
        Ok(()) => info!(path = %path.display(), "persisted cache"),
        Err(err) => warn!(path = %path.display(), error = %err, "failed to persist cache"),
    }
    Ok(value)
}

/// Writes to `{path}.tmp`, syncs, then renames over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
