use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quest_core::model::{UserId, UserProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}

/// Repository contract for per-user progress snapshots.
///
/// A save replaces the whole snapshot; readers never observe a partial write.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the latest snapshot for `user`, or `None` on first use.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be read or decoded.
    async fn load_progress(&self, user: UserId) -> Result<Option<UserProgress>, StorageError>;

    /// Persist `progress` as the latest snapshot for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or stored.
    async fn save_progress(
        &self,
        user: UserId,
        progress: &UserProgress,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// In-memory repository holding encoded snapshots, for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<UserId, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a raw payload as-is, bypassing the encoder.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, user: UserId, payload: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user, payload.into());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, user: UserId) -> Result<Option<UserProgress>, StorageError> {
        let raw = {
            let guard = self
                .snapshots
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(&user).cloned()
        };
        raw.map(|raw| snapshot::decode(&raw).map(|s| s.progress))
            .transpose()
    }

    async fn save_progress(
        &self,
        user: UserId,
        progress: &UserProgress,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let raw = snapshot::encode(progress, saved_at)?;
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user, raw);
        Ok(())
    }
}

/// Aggregate storage facade.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
