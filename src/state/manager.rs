//! Session persistence
//!
//! Provides file-based session persistence with atomic writes, so each
//! process invocation can pick up where the previous one stopped.

use super::types::{ProcessingState, Session};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for persisting and loading the session
#[derive(Debug)]
pub struct StateManager {
    /// Path to the session file
    path: PathBuf,
    /// Current session (cached), `None` until something is enqueued
    session: Arc<RwLock<Option<Session>>>,
    /// Whether to save on every update
    auto_save: bool,
}

impl StateManager {
    /// Create a new state manager with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            session: Arc::new(RwLock::new(None)),
            auto_save: true,
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            session: Arc::new(RwLock::new(None)),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading an existing session if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let session = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_session(&contents)?
        } else {
            None
        };

        Ok(Self {
            path,
            session: Arc::new(RwLock::new(session)),
            auto_save: true,
        })
    }

    /// Reload the session from file
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        let loaded = parse_session(&contents)?;

        *self.session.write().await = loaded;
        Ok(())
    }

    /// Save the current session to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let session = self.session.read().await;
            serde_json::to_string_pretty(&*session)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::state(format!("Failed to create state directory: {e}")))?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The current session, or an error telling the operator to enqueue first
    pub async fn require_session(&self) -> Result<Session> {
        self.session()
            .await
            .ok_or_else(|| Error::state("No active session; enqueue files first"))
    }

    /// Start a new session, discarding any previous one
    pub async fn start(&self, session: Session) -> Result<()> {
        *self.session.write().await = Some(session);
        self.persist().await
    }

    /// Store the controller's next state
    pub async fn update_state(&self, state: ProcessingState) -> Result<()> {
        {
            let mut guard = self.session.write().await;
            let session = guard
                .as_mut()
                .ok_or_else(|| Error::state("No active session to update"))?;
            session.state = state;
        }
        self.persist().await
    }

    /// Reset processing to `{[], 0, false, []}`, keeping the selected profile
    pub async fn reset(&self) -> Result<ProcessingState> {
        let fresh = ProcessingState::reset();
        {
            let mut guard = self.session.write().await;
            if let Some(session) = guard.as_mut() {
                session.state = fresh.clone();
            }
        }
        self.persist().await?;
        Ok(fresh)
    }

    /// Processing state, or the reset state when there is no session
    pub async fn state(&self) -> ProcessingState {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }

    /// Export session as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let session = self.session.read().await;
        serde_json::to_string_pretty(&*session)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    async fn persist(&self) -> Result<()> {
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            session: Arc::clone(&self.session),
            auto_save: self.auto_save,
        }
    }
}

fn parse_session(contents: &str) -> Result<Option<Session>> {
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse state file: {e}")))
}
