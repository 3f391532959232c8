//! Versioned JSON envelope for a persisted `UserProgress`.

use chrono::{DateTime, Utc};
use quest_core::model::UserProgress;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::StorageError;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

const TRACK_KEYS: [&str; 3] = ["html", "css", "javascript"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub progress: UserProgress,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Serialize `progress` into a current-version snapshot.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(progress: &UserProgress, saved_at: DateTime<Utc>) -> Result<String, StorageError> {
    let snapshot = ProgressSnapshot {
        schema_version: CURRENT_SCHEMA_VERSION,
        saved_at,
        progress: progress.clone(),
    };
    serde_json::to_string(&snapshot).map_err(ser)
}

/// Parse a snapshot of any supported version, migrating it forward.
///
/// # Errors
///
/// Returns `StorageError::UnsupportedSchema` for versions newer than this
/// build understands, and `StorageError::Serialization` for malformed input.
pub fn decode(raw: &str) -> Result<ProgressSnapshot, StorageError> {
    let mut value: Value = serde_json::from_str(raw).map_err(ser)?;
    let version = value
        .get("schema_version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| StorageError::Serialization("missing schema_version".into()))?;

    if version > CURRENT_SCHEMA_VERSION || version == 0 {
        return Err(StorageError::UnsupportedSchema {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if version < 2 {
        migrate_v1_to_v2(&mut value)?;
        tracing::debug!(from = version, to = 2, "migrated progress snapshot");
    }

    value["schema_version"] = Value::from(CURRENT_SCHEMA_VERSION);
    serde_json::from_value(value).map_err(ser)
}

/// Version 1 kept per-track time in whole minutes.
fn migrate_v1_to_v2(value: &mut Value) -> Result<(), StorageError> {
    let tracks = value
        .pointer_mut("/progress/tracks")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StorageError::Serialization("snapshot has no tracks".into()))?;

    for key in TRACK_KEYS {
        let Some(track) = tracks.get_mut(key).and_then(Value::as_object_mut) else {
            continue;
        };
        if let Some(minutes) = track.remove("time_spent_minutes") {
            let minutes = minutes.as_u64().unwrap_or(0);
            track.insert("time_spent_secs".into(), Value::from(minutes * 60));
        }
    }
    Ok(())
}
