//! Durable key/value store for user, cart, and transaction state
//!
//! Each item is one JSON file named after its key, kept in an XDG-compliant
//! data directory (`~/.local/share/warehouse/` on Linux).

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads and writes JSON items that outlive the session
#[derive(Debug, Clone)]
pub struct DurableStore {
    /// Directory where item files are stored
    dir: PathBuf,
}

impl DurableStore {
    /// Creates a store in the platform data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "warehouse")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory holding the item files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    /// Writes `value` under `key`, creating the directory if needed
    ///
    /// # Arguments
    /// * `key` - Item key (e.g., "warehouse_app_cart")
    /// * `value` - The value to store
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if directory creation, serialization, or writing fails
    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(self.item_path(key), json)
    }

    /// Reads the item stored under `key`
    ///
    /// Returns `None` if the item is missing, unreadable, or does not parse as `T`.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = match fs::read_to_string(self.item_path(key)) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(key, error = %err, "failed to read stored item");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed stored item");
                None
            }
        }
    }

    /// Reads the item stored under `key`, falling back to `default`
    pub fn get_item_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_item(key).unwrap_or(default)
    }

    /// Removes the item stored under `key`; a missing item is not an error
    pub fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.item_path(key)) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Removes every stored item
    pub fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Maps a key onto a safe file stem
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
