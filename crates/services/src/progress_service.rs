use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use quest_core::daily_goal::{DailyGoal, DailyProgress};
use quest_core::difficulty::{DifficultyProgression, TrackAccess};
use quest_core::engine::{ProgressEvent, Transition, transition};
use quest_core::level::LevelInfo;
use quest_core::model::{Achievement, AttemptDraft, Track, TrackProgress, UserId, UserProgress};
use quest_core::projections::{CategoryProgress, XpSummary};
use quest_core::streak::StreakStatus;
use quest_core::xp::XpReward;
use storage::repository::{ProgressRepository, StorageError};

use crate::Clock;
use crate::error::ProgressServiceError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Where a session's starting state came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOrigin {
    Restored,
    FirstUse,
    /// A snapshot exists but could not be read; the session started fresh.
    LoadFailed(String),
}

/// One learner's progress held in memory between events.
///
/// Owned by the caller and passed `&mut` into the service, so events for a
/// session are applied one at a time.
#[derive(Debug, Clone)]
pub struct ProgressSession {
    user: UserId,
    progress: UserProgress,
    origin: SessionOrigin,
    dirty: bool,
    overwrite_allowed: bool,
}

impl ProgressSession {
    fn new(user: UserId, progress: UserProgress, origin: SessionOrigin) -> Self {
        let overwrite_allowed = !matches!(origin, SessionOrigin::LoadFailed(_));
        Self {
            user,
            progress,
            origin,
            dirty: false,
            overwrite_allowed,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    #[must_use]
    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    /// True when the in-memory state has changes that are not yet saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Permit saves to replace a snapshot that failed to load.
    ///
    /// Sessions that started from an unreadable snapshot refuse to save until
    /// this is called, so a newer build's data is not silently overwritten.
    pub fn allow_overwrite(&mut self) {
        self.overwrite_allowed = true;
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// What a recorded answer earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptOutcome {
    pub reward: Option<XpReward>,
    pub level_before: u32,
    pub level_after: u32,
    pub leveled_up: bool,
    pub new_achievements: Vec<Achievement>,
    pub completed_goals: Vec<DailyGoal>,
    pub total_xp: u64,
}

/// Per-track slice of the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOverview {
    pub track: Track,
    pub progress: TrackProgress,
    pub level: LevelInfo,
    pub difficulty: DifficultyProgression,
    pub categories: Vec<CategoryProgress>,
}

/// Everything a dashboard needs, evaluated for the clock's current day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub user: u64,
    pub level: LevelInfo,
    pub xp: XpSummary,
    pub streak: StreakStatus,
    pub daily: DailyProgress,
    pub tracks: Vec<TrackOverview>,
    pub access: Vec<TrackAccess>,
    pub achievements: Vec<Achievement>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Applies progress events to a session and persists the result.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load the learner's progress into a session.
    ///
    /// Never fails: an unreadable snapshot yields a fresh session tagged
    /// `SessionOrigin::LoadFailed`.
    pub async fn open(&self, user: UserId) -> ProgressSession {
        match self.repo.load_progress(user).await {
            Ok(Some(progress)) => {
                info!(%user, total_xp = progress.total_xp(), "restored progress");
                ProgressSession::new(user, progress, SessionOrigin::Restored)
            }
            Ok(None) => {
                info!(%user, "no saved progress, starting fresh");
                ProgressSession::new(
                    user,
                    UserProgress::new(self.clock.now()),
                    SessionOrigin::FirstUse,
                )
            }
            Err(err) => {
                warn!(%user, error = %err, "could not load progress, starting fresh");
                ProgressSession::new(
                    user,
                    UserProgress::new(self.clock.now()),
                    SessionOrigin::LoadFailed(err.to_string()),
                )
            }
        }
    }

    /// Validate and apply an answer, then save.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` if the draft or event is
    /// rejected (the session is untouched), or `Persistence` if the new state
    /// could not be saved (the session keeps it and stays dirty).
    pub async fn record_attempt(
        &self,
        session: &mut ProgressSession,
        draft: AttemptDraft,
    ) -> Result<AttemptOutcome, ProgressServiceError> {
        let attempt = draft.validate()?;
        let question = attempt.question_id().clone();
        let track = attempt.track();
        let outcome = apply(session, &ProgressEvent::AnswerRecorded(attempt))?;

        info!(
            user = %session.user,
            question = %question,
            track = track.as_str(),
            xp = outcome.reward.as_ref().map_or(0, |r| r.total_xp),
            total_xp = outcome.total_xp,
            "recorded attempt"
        );
        if outcome.leveled_up {
            info!(user = %session.user, level = outcome.level_after, "level up");
        }
        for achievement in &outcome.new_achievements {
            info!(
                user = %session.user,
                achievement = achievement.id.as_str(),
                "achievement unlocked"
            );
        }

        self.persist(session).await?;
        Ok(outcome)
    }

    /// Change the daily XP goal. Takes effect from the next day's goal sheet.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a target outside the accepted range, or
    /// `Persistence` if saving fails.
    pub async fn set_daily_goal(
        &self,
        session: &mut ProgressSession,
        xp_target: u32,
    ) -> Result<(), ProgressServiceError> {
        apply(session, &ProgressEvent::DailyGoalChanged { xp_target })?;
        info!(user = %session.user, xp_target, "daily goal changed");
        self.persist(session).await
    }

    /// Start over, keeping achievements and the daily goal setting.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if saving fails.
    pub async fn reset(&self, session: &mut ProgressSession) -> Result<(), ProgressServiceError> {
        apply(session, &ProgressEvent::Reset { at: self.clock.now() })?;
        info!(user = %session.user, "progress reset");
        self.persist(session).await
    }

    /// Retry saving a dirty session. No-op when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if saving fails again.
    pub async fn flush(&self, session: &mut ProgressSession) -> Result<(), ProgressServiceError> {
        self.persist(session).await
    }

    async fn persist(&self, session: &mut ProgressSession) -> Result<(), ProgressServiceError> {
        if !session.dirty {
            return Ok(());
        }
        if !session.overwrite_allowed {
            warn!(user = %session.user, "refusing to overwrite an unreadable snapshot");
            return Err(StorageError::Conflict.into());
        }

        match self
            .repo
            .save_progress(session.user, &session.progress, self.clock.now())
            .await
        {
            Ok(()) => {
                session.dirty = false;
                Ok(())
            }
            Err(err) => {
                warn!(user = %session.user, error = %err, "failed to save progress");
                Err(err.into())
            }
        }
    }

    //
    // ─── PROJECTIONS ───────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn streak_status(&self, session: &ProgressSession) -> StreakStatus {
        session.progress.streak_status(self.clock.today())
    }

    #[must_use]
    pub fn daily_goal_progress(&self, session: &ProgressSession) -> DailyProgress {
        session.progress.daily_goal_progress(self.clock.today())
    }

    #[must_use]
    pub fn xp_summary(&self, session: &ProgressSession) -> XpSummary {
        session.progress.xp_summary(self.clock.today())
    }

    #[must_use]
    pub fn overview(&self, session: &ProgressSession) -> ProgressOverview {
        let progress = &session.progress;
        let tracks = Track::ALL
            .into_iter()
            .map(|track| TrackOverview {
                track,
                progress: progress.track_progress(track).clone(),
                level: progress.level_info(Some(track)),
                difficulty: progress.difficulty_progression(track),
                categories: progress.category_progress(track),
            })
            .collect();

        ProgressOverview {
            user: session.user.value(),
            level: progress.level_info(None),
            xp: self.xp_summary(session),
            streak: self.streak_status(session),
            daily: self.daily_goal_progress(session),
            tracks,
            access: progress.track_access(),
            achievements: progress.achievements().to_vec(),
        }
    }
}

fn apply(
    session: &mut ProgressSession,
    event: &ProgressEvent,
) -> Result<AttemptOutcome, ProgressServiceError> {
    let Transition {
        progress,
        reward,
        level_before,
        level_after,
        new_achievements,
        completed_goals,
    } = transition(&session.progress, event)?;

    let total_xp = progress.total_xp();
    session.progress = progress;
    session.dirty = true;

    Ok(AttemptOutcome {
        reward,
        level_before,
        level_after,
        leveled_up: level_after > level_before,
        new_achievements,
        completed_goals,
        total_xp,
    })
}
