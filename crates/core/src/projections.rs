//! Read-only views of a `UserProgress` for the UI layer.

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily_goal::DailyProgress;
use crate::difficulty::{self, DifficultyProgression, TierRequirement, TrackAccess};
use crate::level::{LevelInfo, calculate_level_info};
use crate::model::{Difficulty, Track, TrackProgress, UserProgress};
use crate::streak::{StreakStatus, streak_status};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackXp {
    pub track: Track,
    pub total_xp: u64,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XpSummary {
    pub total_xp: u64,
    pub level: LevelInfo,
    pub by_track: Vec<TrackXp>,
    pub bonus_xp_earned: u64,
    pub xp_today: u64,
    pub bonus_xp_today: u32,
    pub streak_multiplier: f64,
}

/// Work done in one difficulty tier of a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProgress {
    pub difficulty: Difficulty,
    pub unlocked: bool,
    pub requirement: TierRequirement,
    pub attempts: u32,
    pub completed: u32,
    pub xp_earned: u64,
}

impl UserProgress {
    #[must_use]
    pub fn track_progress(&self, track: Track) -> &TrackProgress {
        self.tracks.get(track)
    }

    /// Level for one track's XP, or for the overall total when `track` is `None`.
    #[must_use]
    pub fn level_info(&self, track: Option<Track>) -> LevelInfo {
        let xp = track.map_or(self.total_xp, |t| self.tracks.get(t).total_xp());
        calculate_level_info(xp)
    }

    #[must_use]
    pub fn streak_status(&self, today: NaiveDate) -> StreakStatus {
        streak_status(&self.streak, today)
    }

    /// Today's goal sheet; a fresh one if nothing has been recorded today.
    #[must_use]
    pub fn daily_goal_progress(&self, today: NaiveDate) -> DailyProgress {
        match &self.daily {
            Some(daily) if daily.date == today => daily.clone(),
            _ => DailyProgress::start(today, &self.streak.streak_history, self.daily_goal),
        }
    }

    #[must_use]
    pub fn difficulty_progression(&self, track: Track) -> DifficultyProgression {
        let t = self.tracks.get(track);
        difficulty::resolve_progression(track, t.completed_count(), t.accuracy())
    }

    #[must_use]
    pub fn xp_summary(&self, today: NaiveDate) -> XpSummary {
        let by_track = self
            .tracks
            .iter()
            .map(|(track, t)| TrackXp {
                track,
                total_xp: t.total_xp(),
                level: t.current_level(),
            })
            .collect();
        let (xp_today, bonus_xp_today) = match &self.daily {
            Some(daily) if daily.date == today => (daily.xp_earned, daily.bonus_xp),
            _ => (0, 0),
        };

        XpSummary {
            total_xp: self.total_xp,
            level: calculate_level_info(self.total_xp),
            by_track,
            bonus_xp_earned: self.statistics.bonus_xp_earned,
            xp_today,
            bonus_xp_today,
            streak_multiplier: self.streak_status(today).multiplier,
        }
    }

    /// Per-tier breakdown of a track, built from the recorded tallies.
    #[must_use]
    pub fn category_progress(&self, track: Track) -> Vec<CategoryProgress> {
        let t = self.tracks.get(track);
        Difficulty::ALL
            .into_iter()
            .map(|difficulty| {
                let tally = t.tally(difficulty);
                CategoryProgress {
                    difficulty,
                    unlocked: difficulty::is_unlocked(
                        track,
                        difficulty,
                        t.completed_count(),
                        t.accuracy(),
                    ),
                    requirement: difficulty::requirement(track, difficulty),
                    attempts: tally.attempts,
                    completed: tally.completed,
                    xp_earned: tally.xp_earned,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn track_access(&self) -> Vec<TrackAccess> {
        Track::ALL
            .into_iter()
            .map(|track| {
                difficulty::track_access(track, |t| self.tracks.get(t).completed_count())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ProgressEvent, replay};
    use crate::model::AttemptDraft;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn answers(track: &str, difficulty: &str, count: u32, days: i64) -> Vec<ProgressEvent> {
        (0..count)
            .map(|i| {
                ProgressEvent::AnswerRecorded(
                    AttemptDraft {
                        question_id: format!("{track}-{difficulty}-{i}"),
                        track: track.into(),
                        difficulty: difficulty.into(),
                        is_correct: true,
                        time_spent_secs: 25,
                        timestamp: fixed_now() + Duration::days(days),
                        is_first_attempt: true,
                    }
                    .validate()
                    .unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn fresh_learner_views() {
        let progress = UserProgress::new(fixed_now());
        let today = fixed_now().date_naive();

        assert_eq!(progress.level_info(None).current_level, 1);
        assert_eq!(progress.streak_status(today).current_streak, 0);
        assert!(!progress.streak_status(today).lost);
        assert_eq!(progress.daily_goal_progress(today).goals.len(), 4);
        assert_eq!(
            progress.difficulty_progression(Track::Html).current_level,
            Difficulty::Beginner
        );

        let access = progress.track_access();
        assert!(access[0].unlocked);
        assert!(!access[1].unlocked);
        assert!(!access[2].unlocked);
    }

    #[test]
    fn category_progress_reports_real_tallies() {
        let mut events = answers("html", "beginner", 15, 0);
        events.extend(answers("html", "intermediate", 2, 0));
        let progress = replay(UserProgress::new(fixed_now()), &events).unwrap();

        let categories = progress.category_progress(Track::Html);
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].completed, 15);
        assert_eq!(categories[1].completed, 2);
        assert!(categories[1].xp_earned > 0);
        assert!(categories[1].unlocked);
        assert!(!categories[2].unlocked);
        assert_eq!(categories[2].attempts, 0);

        assert!(progress.track_access()[1].unlocked);
    }

    #[test]
    fn xp_summary_splits_by_track() {
        let mut events = answers("html", "beginner", 3, 0);
        events.extend(answers("css", "beginner", 2, 0));
        let progress = replay(UserProgress::new(fixed_now()), &events).unwrap();
        let today = fixed_now().date_naive();

        let summary = progress.xp_summary(today);
        let track_xp: u64 = summary.by_track.iter().map(|t| t.total_xp).sum();
        assert_eq!(summary.total_xp, track_xp + summary.bonus_xp_earned);
        assert_eq!(summary.xp_today, track_xp);
        assert_eq!(
            progress.level_info(Some(Track::Css)).current_level,
            progress.track_progress(Track::Css).current_level()
        );

        let tomorrow = progress.xp_summary(today + Duration::days(1));
        assert_eq!(tomorrow.xp_today, 0);
    }
}
