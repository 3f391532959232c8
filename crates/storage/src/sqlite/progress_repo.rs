use chrono::{DateTime, Utc};
use quest_core::model::{UserId, UserProgress};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ProgressRepository, StorageError};
use crate::snapshot::{self, CURRENT_SCHEMA_VERSION};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn user_key(user: UserId) -> Result<i64, StorageError> {
    i64::try_from(user.value()).map_err(|_| StorageError::Serialization("user id overflow".into()))
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, user: UserId) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query("SELECT payload FROM progress_snapshots WHERE user_id = ?1")
            .bind(user_key(user)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(conn)?;
        let snapshot = snapshot::decode(&payload)?;
        tracing::debug!(%user, saved_at = %snapshot.saved_at, "loaded progress snapshot");
        Ok(Some(snapshot.progress))
    }

    async fn save_progress(
        &self,
        user: UserId,
        progress: &UserProgress,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = snapshot::encode(progress, saved_at)?;
        sqlx::query(
            r"
            INSERT INTO progress_snapshots (user_id, schema_version, payload, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(user_key(user)?)
        .bind(i64::from(CURRENT_SCHEMA_VERSION))
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
