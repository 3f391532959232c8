use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::Track;
use crate::streak::{DayActivity, StreakHistoryEntry};
use crate::time::day_key;

/// Days of history (before today) used to size a day's goals.
pub const HISTORY_WINDOW_DAYS: i64 = 7;

/// Headroom over the historical average when sizing a goal.
const STRETCH: f64 = 1.1;

pub const XP_TARGET_RANGE: (u32, u32) = (20, 300);
pub const QUESTION_TARGET_RANGE: (u32, u32) = (3, 15);
pub const TIME_TARGET_RANGE_MINUTES: (u32, u32) = (10, 60);

const DEFAULT_QUESTION_TARGET: u32 = 5;
const DEFAULT_TIME_TARGET_MINUTES: u32 = 15;
const STREAK_TARGET_DAYS: u32 = 1;

//
// ─── GOALS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Xp,
    Questions,
    Time,
    Streak,
}

impl GoalKind {
    pub const ALL: [GoalKind; 4] = [
        GoalKind::Xp,
        GoalKind::Questions,
        GoalKind::Time,
        GoalKind::Streak,
    ];

    /// Bonus XP granted on completion, as a fraction of the target.
    #[must_use]
    pub fn bonus_rate(self) -> f64 {
        match self {
            GoalKind::Xp => 0.1,
            GoalKind::Questions => 1.0,
            GoalKind::Time => 0.5,
            GoalKind::Streak => 5.0,
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            GoalKind::Xp => "Earn XP",
            GoalKind::Questions => "Answer questions",
            GoalKind::Time => "Minutes of practice",
            GoalKind::Streak => "Keep your streak alive",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalKind::Xp => "xp",
            GoalKind::Questions => "questions",
            GoalKind::Time => "time",
            GoalKind::Streak => "streak",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub id: String,
    pub kind: GoalKind,
    pub target: u32,
    pub current: u32,
    pub completed: bool,
    pub bonus: u32,
}

impl DailyGoal {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(date: NaiveDate, kind: GoalKind, target: u32) -> Self {
        let bonus = (f64::from(target) * kind.bonus_rate()).round() as u32;
        Self {
            id: format!("{kind}-{}", day_key(date)),
            kind,
            target,
            current: 0,
            completed: false,
            bonus,
        }
    }

    /// Raise `current`, never lowering it. Returns true if this completes the goal.
    fn raise_to(&mut self, value: u32) -> bool {
        self.current = self.current.max(value);
        let was_completed = self.completed;
        self.completed = self.current >= self.target;
        self.completed && !was_completed
    }
}

//
// ─── TARGETS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalTargets {
    pub xp: u32,
    pub questions: u32,
    pub time_minutes: u32,
    pub streak_days: u32,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_round(value: f64, (min, max): (u32, u32)) -> u32 {
    (value.round().max(0.0) as u32).clamp(min, max)
}

fn round_to_five(value: f64) -> f64 {
    (value / 5.0).round() * 5.0
}

/// Size today's goals from the active days in the preceding window.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn derive_targets(
    today: NaiveDate,
    history: &[StreakHistoryEntry],
    xp_goal: u32,
) -> GoalTargets {
    let window_start = today - Duration::days(HISTORY_WINDOW_DAYS);
    let recent: Vec<&StreakHistoryEntry> = history
        .iter()
        .filter(|entry| entry.date >= window_start && entry.date < today)
        .collect();

    if recent.is_empty() {
        return GoalTargets {
            xp: xp_goal,
            questions: DEFAULT_QUESTION_TARGET,
            time_minutes: DEFAULT_TIME_TARGET_MINUTES,
            streak_days: STREAK_TARGET_DAYS,
        };
    }

    let days = recent.len() as f64;
    let avg_xp = recent.iter().map(|e| e.xp_earned as f64).sum::<f64>() / days;
    let avg_questions = recent
        .iter()
        .map(|e| f64::from(e.questions_answered))
        .sum::<f64>()
        / days;
    let avg_minutes = recent
        .iter()
        .map(|e| e.time_spent_secs as f64 / 60.0)
        .sum::<f64>()
        / days;

    GoalTargets {
        xp: xp_goal.max(clamp_round(round_to_five(avg_xp * STRETCH), XP_TARGET_RANGE)),
        questions: clamp_round(avg_questions * STRETCH, QUESTION_TARGET_RANGE),
        time_minutes: clamp_round(avg_minutes * STRETCH, TIME_TARGET_RANGE_MINUTES),
        streak_days: STREAK_TARGET_DAYS,
    }
}

//
// ─── DAILY PROGRESS ────────────────────────────────────────────────────────────
//

/// Today's totals across tracks and the goal sheet they feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub xp_earned: u64,
    pub questions_answered: u32,
    pub time_spent_secs: u64,
    pub tracks: BTreeSet<Track>,
    pub goals: Vec<DailyGoal>,
    pub bonus_xp: u32,
}

impl DailyProgress {
    /// Fresh goal sheet for `today`.
    #[must_use]
    pub fn start(today: NaiveDate, history: &[StreakHistoryEntry], xp_goal: u32) -> Self {
        let targets = derive_targets(today, history, xp_goal);
        let goals = vec![
            DailyGoal::new(today, GoalKind::Xp, targets.xp),
            DailyGoal::new(today, GoalKind::Questions, targets.questions),
            DailyGoal::new(today, GoalKind::Time, targets.time_minutes),
            DailyGoal::new(today, GoalKind::Streak, targets.streak_days),
        ];
        Self {
            date: today,
            xp_earned: 0,
            questions_answered: 0,
            time_spent_secs: 0,
            tracks: BTreeSet::new(),
            goals,
            bonus_xp: 0,
        }
    }

    /// Add one activity and return the goals it completed.
    pub fn record(&mut self, activity: &DayActivity) -> Vec<DailyGoal> {
        self.xp_earned += u64::from(activity.xp_earned);
        self.questions_answered = self
            .questions_answered
            .saturating_add(activity.questions_answered);
        self.time_spent_secs += u64::from(activity.time_spent_secs);
        self.tracks.insert(activity.track);

        let xp = u32::try_from(self.xp_earned).unwrap_or(u32::MAX);
        let minutes = u32::try_from(self.time_spent_secs / 60).unwrap_or(u32::MAX);
        let active_days = u32::from(self.questions_answered > 0);

        let mut completed = Vec::new();
        for goal in &mut self.goals {
            let value = match goal.kind {
                GoalKind::Xp => xp,
                GoalKind::Questions => self.questions_answered,
                GoalKind::Time => minutes,
                GoalKind::Streak => active_days,
            };
            if goal.raise_to(value) {
                completed.push(goal.clone());
            }
        }

        self.bonus_xp = self
            .goals
            .iter()
            .filter(|goal| goal.completed)
            .map(|goal| goal.bonus)
            .sum();
        completed
    }

    #[must_use]
    pub fn goal(&self, kind: GoalKind) -> Option<&DailyGoal> {
        self.goals.iter().find(|goal| goal.kind == kind)
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.goals.iter().all(|goal| goal.completed)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.goals.iter().filter(|goal| goal.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn entry(date: NaiveDate, xp: u64, questions: u32, secs: u64) -> StreakHistoryEntry {
        StreakHistoryEntry {
            date,
            xp_earned: xp,
            questions_answered: questions,
            tracks: BTreeSet::from([Track::Html]),
            time_spent_secs: secs,
        }
    }

    fn activity(xp: u32, secs: u32) -> DayActivity {
        DayActivity {
            xp_earned: xp,
            questions_answered: 1,
            time_spent_secs: secs,
            track: Track::Html,
        }
    }

    #[test]
    fn defaults_without_history() {
        let targets = derive_targets(day(10), &[], 50);
        assert_eq!(targets.xp, 50);
        assert_eq!(targets.questions, 5);
        assert_eq!(targets.time_minutes, 15);
        assert_eq!(targets.streak_days, 1);
    }

    #[test]
    fn targets_follow_recent_averages_within_bounds() {
        let history = vec![
            entry(day(1), 1_000, 40, 7_200), // outside the window
            entry(day(7), 100, 8, 1_200),
            entry(day(8), 140, 12, 1_800),
            entry(day(10), 500, 50, 9_000), // today, ignored
        ];
        let targets = derive_targets(day(10), &history, 50);
        // avg xp 120 * 1.1 = 132 -> 130
        assert_eq!(targets.xp, 130);
        // avg questions 10 * 1.1 = 11
        assert_eq!(targets.questions, 11);
        // avg minutes 25 * 1.1 = 27.5 -> 28
        assert_eq!(targets.time_minutes, 28);
    }

    #[test]
    fn targets_are_clamped() {
        let light = vec![entry(day(9), 5, 1, 60)];
        let targets = derive_targets(day(10), &light, 10);
        assert_eq!(targets.xp, 20);
        assert_eq!(targets.questions, 3);
        assert_eq!(targets.time_minutes, 10);

        let heavy = vec![entry(day(9), 10_000, 200, 36_000)];
        let targets = derive_targets(day(10), &heavy, 50);
        assert_eq!(targets.xp, 300);
        assert_eq!(targets.questions, 15);
        assert_eq!(targets.time_minutes, 60);
    }

    #[test]
    fn xp_goal_completes_with_ten_percent_bonus() {
        let mut daily = DailyProgress::start(day(10), &[], 50);
        let first = daily.record(&activity(30, 60));
        assert!(first.iter().any(|g| g.kind == GoalKind::Streak));
        assert!(!daily.goal(GoalKind::Xp).unwrap().completed);

        let second = daily.record(&activity(20, 60));
        let xp_goal = second.iter().find(|g| g.kind == GoalKind::Xp).unwrap();
        assert_eq!(xp_goal.bonus, 5);
        assert!(daily.goal(GoalKind::Xp).unwrap().completed);
        assert_eq!(daily.bonus_xp, 5 + 5);
    }

    #[test]
    fn goals_complete_only_once_and_never_regress() {
        let mut daily = DailyProgress::start(day(10), &[], 20);
        assert_eq!(daily.record(&activity(25, 0)).len(), 2);
        assert!(daily.record(&activity(0, 0)).is_empty());
        let xp = daily.goal(GoalKind::Xp).unwrap();
        assert_eq!(xp.current, 25);
        assert!(xp.completed);
    }

    #[test]
    fn all_goals_complete() {
        let mut daily = DailyProgress::start(day(10), &[], 20);
        for _ in 0..5 {
            daily.record(&activity(10, 200));
        }
        assert!(daily.all_completed());
        assert_eq!(daily.completed_count(), 4);
        // 2 + 5 + 8 + 5
        assert_eq!(daily.bonus_xp, 20);
        assert_eq!(daily.goal(GoalKind::Time).unwrap().id, "time-2024-05-10");
    }
}
