//! Shared application state.
//!
//! `CoreState` is created once at startup, wrapped in `Arc`, and handed
//! to the HTTP layer. It deliberately holds no database connection:
//! every request opens its own via [`CoreState::open_db`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::advisory::AdvisoryClient;
use crate::db;
use crate::session::SessionStore;

pub struct CoreState {
    /// SQLite database file. Migrated once at startup.
    pub db_path: PathBuf,
    /// Live login sessions. Never hold the guard across an `.await`.
    sessions: Mutex<SessionStore>,
    advisor: Arc<dyn AdvisoryClient>,
}

impl CoreState {
    pub fn new(db_path: PathBuf, session_idle: Duration, advisor: Arc<dyn AdvisoryClient>) -> Self {
        Self {
            db_path,
            sessions: Mutex::new(SessionStore::new(session_idle)),
            advisor,
        }
    }

    /// Open a fresh connection for the current request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn lock_sessions(&self) -> Result<MutexGuard<'_, SessionStore>, CoreError> {
        self.sessions.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Shared handle to the advisory collaborator.
    pub fn advisor(&self) -> Arc<dyn AdvisoryClient> {
        Arc::clone(&self.advisor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
