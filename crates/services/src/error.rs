//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::ValidationError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    /// The event was rejected; the session is unchanged.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The event was applied in memory but the snapshot could not be saved.
    #[error("progress was updated but not saved: {0}")]
    Persistence(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
