use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::daily_goal::DailyProgress;
use crate::level::level_for_xp;
use crate::model::achievement::Achievement;
use crate::model::attempt::QuestionAttempt;
use crate::model::ids::QuestionId;
use crate::model::track::{Difficulty, Track};
use crate::streak::{StreakData, advance_streak};

/// XP target for a new learner's daily goal.
pub const DEFAULT_DAILY_GOAL_XP: u32 = 50;

/// Answers at or under this many seconds count as fast.
pub const FAST_ANSWER_SECS: u32 = 10;

#[allow(clippy::cast_precision_loss)]
fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).clamp(0.0, 100.0)
}

//
// ─── DIFFICULTY TALLY ──────────────────────────────────────────────────────────
//

/// Work done at one difficulty tier of one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTally {
    pub attempts: u32,
    pub completed: u32,
    pub xp_earned: u64,
}

//
// ─── TRACK PROGRESS ────────────────────────────────────────────────────────────
//

/// Progress through a single track. Owned by `UserProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackProgress {
    current_level: u32,
    total_xp: u64,
    completed_questions: BTreeSet<QuestionId>,
    current_streak: u32,
    longest_streak: u32,
    last_activity_date: Option<NaiveDate>,
    accuracy: f64,
    time_spent_secs: u64,
    attempts: u32,
    correct_answers: u32,
    #[serde(default)]
    by_difficulty: BTreeMap<Difficulty, DifficultyTally>,
}

impl Default for TrackProgress {
    fn default() -> Self {
        Self {
            current_level: 1,
            total_xp: 0,
            completed_questions: BTreeSet::new(),
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            accuracy: 0.0,
            time_spent_secs: 0,
            attempts: 0,
            correct_answers: 0,
            by_difficulty: BTreeMap::new(),
        }
    }
}

impl TrackProgress {
    #[must_use]
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    #[must_use]
    pub fn completed_questions(&self) -> &BTreeSet<QuestionId> {
        &self.completed_questions
    }

    /// Number of distinct questions answered correctly.
    #[must_use]
    pub fn completed_count(&self) -> u32 {
        u32::try_from(self.completed_questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.last_activity_date
    }

    /// Share of correct answers, 0–100.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    /// Whole minutes spent in this track.
    #[must_use]
    pub fn time_spent_minutes(&self) -> u64 {
        self.time_spent_secs / 60
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Tally for one difficulty tier (zeroes if never practiced).
    #[must_use]
    pub fn tally(&self, difficulty: Difficulty) -> DifficultyTally {
        self.by_difficulty
            .get(&difficulty)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn apply_attempt(&mut self, attempt: &QuestionAttempt, xp: u32) {
        let today = attempt.day();
        let step = advance_streak(
            self.current_streak,
            self.longest_streak,
            self.last_activity_date,
            today,
        );
        self.current_streak = step.current;
        self.longest_streak = step.longest;
        self.last_activity_date = Some(today);

        self.attempts = self.attempts.saturating_add(1);
        self.time_spent_secs += u64::from(attempt.time_spent_secs());
        self.total_xp += u64::from(xp);
        self.current_level = level_for_xp(self.total_xp);

        let tally = self.by_difficulty.entry(attempt.difficulty()).or_default();
        tally.attempts = tally.attempts.saturating_add(1);
        tally.xp_earned += u64::from(xp);

        if attempt.is_correct() {
            self.correct_answers = self.correct_answers.saturating_add(1);
            if self.completed_questions.insert(attempt.question_id().clone()) {
                tally.completed = tally.completed.saturating_add(1);
            }
        }
        self.accuracy = percentage(self.correct_answers, self.attempts);
    }
}

//
// ─── TRACKS ────────────────────────────────────────────────────────────────────
//

/// One `TrackProgress` per curriculum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    pub html: TrackProgress,
    pub css: TrackProgress,
    pub javascript: TrackProgress,
}

impl Tracks {
    #[must_use]
    pub fn get(&self, track: Track) -> &TrackProgress {
        match track {
            Track::Html => &self.html,
            Track::Css => &self.css,
            Track::Javascript => &self.javascript,
        }
    }

    pub(crate) fn get_mut(&mut self, track: Track) -> &mut TrackProgress {
        match track {
            Track::Html => &mut self.html,
            Track::Css => &mut self.css,
            Track::Javascript => &mut self.javascript,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Track, &TrackProgress)> {
        Track::ALL.into_iter().map(move |track| (track, self.get(track)))
    }
}

//
// ─── STATISTICS ────────────────────────────────────────────────────────────────
//

/// Lifetime counters across all tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_attempts: u32,
    pub correct_answers: u32,
    pub total_time_spent_secs: u64,
    pub fast_correct_answers: u32,
    pub perfect_days: u32,
    pub bonus_xp_earned: u64,
}

impl Statistics {
    /// Overall share of correct answers, 0–100.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        percentage(self.correct_answers, self.total_attempts)
    }

    pub(crate) fn record(&mut self, attempt: &QuestionAttempt) {
        self.total_attempts = self.total_attempts.saturating_add(1);
        self.total_time_spent_secs += u64::from(attempt.time_spent_secs());
        if attempt.is_correct() {
            self.correct_answers = self.correct_answers.saturating_add(1);
            if attempt.time_spent_secs() <= FAST_ANSWER_SECS {
                self.fast_correct_answers = self.fast_correct_answers.saturating_add(1);
            }
        }
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Aggregate root for everything the engine knows about a learner.
///
/// Only the engine's `transition` produces new values; everything else reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub(crate) total_xp: u64,
    #[serde(flatten)]
    pub(crate) streak: StreakData,
    pub(crate) daily_goal: u32,
    pub(crate) tracks: Tracks,
    pub(crate) achievements: Vec<Achievement>,
    pub(crate) statistics: Statistics,
    #[serde(default)]
    pub(crate) daily: Option<DailyProgress>,
    pub(crate) created_at: DateTime<Utc>,
}

impl UserProgress {
    /// Fresh progress for a first-time learner.
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            total_xp: 0,
            streak: StreakData::default(),
            daily_goal: DEFAULT_DAILY_GOAL_XP,
            tracks: Tracks::default(),
            achievements: Vec::new(),
            statistics: Statistics::default(),
            daily: None,
            created_at,
        }
    }

    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.streak.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.streak.longest_streak
    }

    #[must_use]
    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.streak.last_activity_date
    }

    /// XP target used when deriving each day's XP goal.
    #[must_use]
    pub fn daily_goal(&self) -> u32 {
        self.daily_goal
    }

    #[must_use]
    pub fn streak(&self) -> &StreakData {
        &self.streak
    }

    #[must_use]
    pub fn tracks(&self) -> &Tracks {
        &self.tracks
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Goal sheet of the most recent active day, if any.
    #[must_use]
    pub fn daily(&self) -> Option<&DailyProgress> {
        self.daily.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
