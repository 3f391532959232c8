use chrono::Duration;
use quest_core::engine::{ProgressEvent, replay};
use quest_core::model::{AttemptDraft, Track, UserId, UserProgress};
use quest_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage, StorageError};
use storage::snapshot::CURRENT_SCHEMA_VERSION;
use storage::sqlite::SqliteRepository;

fn answer(id: &str, track: &str, days: i64) -> ProgressEvent {
    ProgressEvent::AnswerRecorded(
        AttemptDraft {
            question_id: id.into(),
            track: track.into(),
            difficulty: "beginner".into(),
            is_correct: true,
            time_spent_secs: 20,
            timestamp: fixed_now() + Duration::days(days),
            is_first_attempt: true,
        }
        .validate()
        .unwrap(),
    )
}

fn three_day_learner() -> UserProgress {
    let events = vec![
        answer("html-1", "html", 0),
        answer("html-2", "html", 1),
        answer("css-1", "css", 2),
    ];
    replay(UserProgress::new(fixed_now()), &events).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1);
    assert!(repo.load_progress(user).await.unwrap().is_none());

    let progress = three_day_learner();
    repo.save_progress(user, &progress, fixed_now())
        .await
        .unwrap();

    let loaded = repo.load_progress(user).await.unwrap().expect("saved");
    assert_eq!(loaded, progress);
    assert_eq!(loaded.current_streak(), 3);
    assert_eq!(loaded.tracks().get(Track::Html).completed_count(), 2);
    assert_eq!(loaded.streak().streak_history.len(), 3);
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.migrate().await.expect("migrations are idempotent");

    let user = UserId::new(7);
    repo.save_progress(user, &UserProgress::new(fixed_now()), fixed_now())
        .await
        .unwrap();
    let progress = three_day_learner();
    repo.save_progress(user, &progress, fixed_now() + Duration::days(3))
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress_snapshots")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(repo.load_progress(user).await.unwrap(), Some(progress));
}

#[tokio::test]
async fn sqlite_rejects_snapshots_from_newer_builds() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_newer?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(3);
    repo.save_progress(user, &three_day_learner(), fixed_now())
        .await
        .unwrap();

    let payload: String =
        sqlx::query_scalar("SELECT payload FROM progress_snapshots WHERE user_id = 3")
            .fetch_one(repo.pool())
            .await
            .unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    value["schema_version"] = serde_json::Value::from(CURRENT_SCHEMA_VERSION + 1);
    sqlx::query("UPDATE progress_snapshots SET payload = ?1 WHERE user_id = 3")
        .bind(value.to_string())
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.load_progress(user).await.unwrap_err();
    assert!(matches!(err, StorageError::UnsupportedSchema { .. }));
}

#[tokio::test]
async fn storage_facade_wires_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_facade?mode=memory&cache=shared")
        .await
        .expect("storage");
    let user = UserId::new(2);
    storage
        .progress
        .save_progress(user, &three_day_learner(), fixed_now())
        .await
        .unwrap();
    let loaded = storage.progress.load_progress(user).await.unwrap();
    assert_eq!(loaded.map(|p| p.total_xp()), Some(three_day_learner().total_xp()));
}
