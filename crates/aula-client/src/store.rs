//! Durable key-value storage backing the session.
//!
//! The session keeps three entries (`access_token`, `refresh_token`, `user`)
//! that are written and cleared as a unit. [`MemoryStore`] serves tests and
//! short-lived processes; [`FileStore`] persists a JSON map so a session
//! survives restarts.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Storage key of the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key of the JSON-encoded cached profile.
pub const USER_KEY: &str = "user";
/// Every key owned by the session.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Errors raised by session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the backing file failed.
    #[error("failed to read session store {}", .path.display())]
    Read {
        /// Backing file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Writing the backing file failed.
    #[error("failed to write session store {}", .path.display())]
    Write {
        /// Backing file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The backing file does not hold a JSON string map.
    #[error("session store {} is corrupt", .path.display())]
    Format {
        /// Backing file.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A value could not be encoded for storage.
    #[error("failed to encode session entry")]
    Encode {
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

/// Whole-value key-value storage shared by every session writer.
///
/// `set_many` and `remove_many` must apply all entries or none.
pub trait SessionStore: Send + Sync {
    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write several entries together.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Remove several entries together.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Write one entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_many(&[(key, value)])
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON file store with write-through persistence.
///
/// Every mutation rewrites the file through a temporary sibling and a rename,
/// so readers never observe a partially written map.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; a missing or empty file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Format {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        mutate(&mut next);
        if next == *entries {
            return Ok(());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let payload =
            serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Encode { source })?;
        let staging = self.path.with_extension("tmp");
        write_private(&staging, &payload).map_err(write_error)?;
        fs::rename(&staging, &self.path).map_err(write_error)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<(), StoreError> {
        self.commit(|entries| {
            for (key, value) in new_entries {
                entries.insert((*key).to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.commit(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

fn write_private(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // The mode only applies on creation; a leftover staging file keeps its own.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(payload)?;
    file.sync_all()
}
