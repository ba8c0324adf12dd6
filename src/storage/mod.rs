//! Persistence layer.
//!
//! Two kinds of file live across runs: one identifier cache per marketplace
//! (`name → id`) and the price history (`name → last lowest price`). Both
//! are flat JSON objects. Loads are tolerant (a missing or corrupt file is
//! an empty map) and saves go through a temp file plus rename so a crash
//! mid-write leaves the previous contents intact.

pub mod history;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use history::HistoryStore;

/// Load a JSON object file into a map.
///
/// Returns an empty map if the file does not exist or cannot be parsed.
pub fn load_map<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    if !path.exists() {
        info!(path = %path.display(), "No saved file found, starting empty");
        return BTreeMap::new();
    }

    let json = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read file, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, V>>(&json) {
        Ok(map) => {
            debug!(path = %path.display(), entries = map.len(), "Loaded from disk");
            map
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt file, starting empty");
            BTreeMap::new()
        }
    }
}

/// Serialize `value` as pretty JSON and replace `path` atomically.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise JSON")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    debug!(path = %path.display(), "Saved to disk");
    Ok(())
}

/// Delete a persisted file (for testing or reset).
pub fn delete_file(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete {}", path.display()))?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
