//! Session store backends.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use flowkit_protocols::{SessionStore, SessionStoreError, State};

use crate::session::{validate_session_id, Session};

/// In-memory session store.
///
/// States are cloned on the way in and on the way out, so callers never
/// share a live `State` with the store.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Full session record, including timestamps.
    pub async fn session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<Option<State>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).map(|s| s.state.clone()))
    }

    async fn save_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
        state: &State,
    ) -> Result<(), SessionStoreError> {
        validate_session_id(session_id)?;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(existing) => existing.replace_state(state.clone()),
            None => {
                sessions.insert(
                    session_id.to_string(),
                    Session::new(session_id, state.clone()),
                );
            }
        }
        Ok(())
    }

    async fn delete_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_sessions(
        &self,
        _ctx: &CancellationToken,
    ) -> Result<Vec<String>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().cloned().collect())
    }
}

/// File-based session store: one JSON document per session.
pub struct FileSessionStore {
    directory: PathBuf,
}

impl FileSessionStore {
    /// Create a new file session store.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}.json", id))
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, SessionStoreError> {
        validate_session_id(id)?;
        let path = self.session_path(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<Option<State>, SessionStoreError> {
        Ok(self.load(session_id).await?.map(|s| s.state))
    }

    async fn save_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
        state: &State,
    ) -> Result<(), SessionStoreError> {
        let session = match self.load(session_id).await? {
            Some(mut existing) => {
                existing.replace_state(state.clone());
                existing
            }
            None => Session::new(session_id, state.clone()),
        };

        tokio::fs::create_dir_all(&self.directory).await?;
        let json = serde_json::to_string_pretty(&session)?;
        let path = self.session_path(session_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(session_id = %session_id, path = ?path, "Saved session");
        Ok(())
    }

    async fn delete_session(
        &self,
        _ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<(), SessionStoreError> {
        validate_session_id(session_id)?;
        let path = self.session_path(session_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(session_id = %session_id, "Deleted session file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_sessions(
        &self,
        _ctx: &CancellationToken,
    ) -> Result<Vec<String>, SessionStoreError> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(id) = name.strip_suffix(".json") {
                    ids.push(id.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
