// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistent storage for recorded sessions.
//!
//! Sessions are stored in their JSON form under string keys. Keys are
//! built by the controller from the configured prefix and a session name.

use crate::error::{RecorderError, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkthrough_timeline::RecordedSession;

const SESSION_EXTENSION: &str = "json";

/// Key-value storage for sessions
pub trait SessionStore {
    /// Store a session, replacing any previous one under the key
    fn save(&mut self, key: &str, session: &RecordedSession) -> Result<()>;

    /// Load and validate a session
    fn load(&self, key: &str) -> Result<RecordedSession>;

    /// Stored keys in sorted order
    fn list(&self) -> Result<Vec<String>>;

    /// Delete a session. Returns `false` if the key was absent.
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// In-memory store. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<IndexMap<String, String>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw JSON under a key, bypassing encoding
    pub fn insert_raw(&self, key: impl Into<String>, json: impl Into<String>) {
        self.entries.write().insert(key.into(), json.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, key: &str, session: &RecordedSession) -> Result<()> {
        let json = session.to_json()?;
        self.entries.write().insert(key.to_string(), json);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<RecordedSession> {
        let entries = self.entries.read();
        let json = entries
            .get(key)
            .ok_or_else(|| RecorderError::SessionNotFound(key.to_string()))?;
        Ok(RecordedSession::from_json(json)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.write().shift_remove(key).is_some())
    }
}

/// Store writing one JSON file per session into a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Opened session store at {:?}", dir);
        Ok(Self { dir })
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SESSION_EXTENSION}"))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&mut self, key: &str, session: &RecordedSession) -> Result<()> {
        let path = self.path_for(key);
        std::fs::write(&path, session.to_json()?)?;
        tracing::info!("Saved session to {:?}", path);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<RecordedSession> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(RecorderError::SessionNotFound(key.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(RecordedSession::from_json(&content)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SESSION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}
