//! Key-value persistence port.
//!
//! Every piece of durable state (users, session, projects, team roster,
//! notifications, drafts, theme) is a JSON document stored under one
//! [`StoreKey`]. The coordinator talks to an injected [`KeyValueStore`]; the
//! two adapters here are a directory of files and an in-memory map.

use crate::draft::DraftKey;
use crate::error::{NexusError, Result};
use crate::{io, paths};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Projects,
    Team,
    Notifications,
    Theme,
    Session,
    Users,
    SelectedProject,
    Draft(DraftKey),
}

impl StoreKey {
    pub fn as_string(&self) -> String {
        match self {
            StoreKey::Projects => "nexus_projects".to_string(),
            StoreKey::Team => "nexus_team".to_string(),
            StoreKey::Notifications => "nexus_notifications".to_string(),
            StoreKey::Theme => "theme".to_string(),
            StoreKey::Session => "nexus_session".to_string(),
            StoreKey::Users => "nexus_users".to_string(),
            StoreKey::SelectedProject => "nexus_selected_project".to_string(),
            StoreKey::Draft(d) => d.storage_key(),
        }
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<String>>;
    fn set(&self, key: &StoreKey, value: &str) -> Result<()>;
    fn remove(&self, key: &StoreKey) -> Result<()>;
}

/// Read and decode a JSON document. A missing key is `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &StoreKey) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &StoreKey, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One file per key under `<root>/.nexus/store/`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path) -> Self {
        FileStore {
            root: root.to_path_buf(),
        }
    }

    fn path(&self, key: &StoreKey) -> PathBuf {
        let safe: String = key
            .as_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        paths::store_entry(&self.root, &safe)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>> {
        io::read_optional(&self.path(key))
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<()> {
        io::atomic_write(&self.path(key), value.as_bytes()).map_err(|e| NexusError::Storage {
            key: key.as_string(),
            reason: e.to_string(),
        })
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        io::remove_if_exists(&self.path(key))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. An optional byte quota makes `set` fail once the total
/// stored size would exceed it, the way browser storage does.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStore {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    fn poisoned(key: &StoreKey) -> NexusError {
        NexusError::Storage {
            key: key.as_string(),
            reason: "store lock poisoned".to_string(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        Ok(entries.get(&key.as_string()).cloned())
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        let name = key.as_string();
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| **k != name)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + name.len() + value.len() > quota {
                return Err(NexusError::QuotaExceeded(name));
            }
        }
        entries.insert(name, value.to_string());
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        entries.remove(&key.as_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
