use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Track;
use crate::time::days_between;

//
// ─── HISTORY ───────────────────────────────────────────────────────────────────
//

/// Totals for one active calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub date: NaiveDate,
    pub xp_earned: u64,
    pub questions_answered: u32,
    pub tracks: BTreeSet<Track>,
    #[serde(default)]
    pub time_spent_secs: u64,
}

impl StreakHistoryEntry {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            xp_earned: 0,
            questions_answered: 0,
            tracks: BTreeSet::new(),
            time_spent_secs: 0,
        }
    }
}

/// What a single event adds to its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayActivity {
    pub xp_earned: u32,
    pub questions_answered: u32,
    pub time_spent_secs: u32,
    pub track: Track,
}

//
// ─── STREAK DATA ───────────────────────────────────────────────────────────────
//

/// Day-streak state plus the per-day history it can be rebuilt from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak_history: Vec<StreakHistoryEntry>,
}

/// Result of moving a streak counter to a new active day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakStep {
    pub current: u32,
    pub longest: u32,
    pub gap: Option<i64>,
}

/// Day-gap rule shared by the overall and per-track counters.
///
/// Gap 0 keeps the counter, gap 1 extends it, anything larger (or a first
/// activity) starts over at 1. Callers reject negative gaps before getting here.
#[must_use]
pub fn advance_streak(
    current: u32,
    longest: u32,
    last_activity: Option<NaiveDate>,
    today: NaiveDate,
) -> StreakStep {
    let gap = last_activity.map(|last| days_between(last, today));
    let current = match gap {
        Some(0) => current.max(1),
        Some(1) => current.saturating_add(1),
        _ => 1,
    };
    StreakStep {
        current,
        longest: longest.max(current),
        gap,
    }
}

impl StreakData {
    /// Fold one activity on `today` into the streak and its history.
    ///
    /// The history keeps one entry per date; a same-day activity replaces
    /// today's entry with the merged totals.
    pub fn record_activity(&mut self, today: NaiveDate, activity: &DayActivity) {
        let step = advance_streak(
            self.current_streak,
            self.longest_streak,
            self.last_activity_date,
            today,
        );
        self.current_streak = step.current;
        self.longest_streak = step.longest;
        self.last_activity_date = Some(today);

        let position = self
            .streak_history
            .binary_search_by_key(&today, |entry| entry.date);
        let mut entry = match position {
            Ok(index) => self.streak_history.remove(index),
            Err(_) => StreakHistoryEntry::empty(today),
        };
        entry.xp_earned += u64::from(activity.xp_earned);
        entry.questions_answered = entry
            .questions_answered
            .saturating_add(activity.questions_answered);
        entry.time_spent_secs += u64::from(activity.time_spent_secs);
        entry.tracks.insert(activity.track);

        let index = match position {
            Ok(index) | Err(index) => index,
        };
        self.streak_history.insert(index, entry);
    }

    /// History entry for a date, if that day was active.
    #[must_use]
    pub fn entry_for(&self, date: NaiveDate) -> Option<&StreakHistoryEntry> {
        self.streak_history
            .binary_search_by_key(&date, |entry| entry.date)
            .ok()
            .map(|index| &self.streak_history[index])
    }
}

//
// ─── FULL RECOMPUTE ────────────────────────────────────────────────────────────
//

/// Streak counters rebuilt from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCounts {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Rebuild the counters from history alone.
///
/// Walks the dates newest first. The current streak is the run ending at the
/// newest date, and only counts while that date is today or yesterday.
#[must_use]
pub fn recompute(history: &[StreakHistoryEntry], today: NaiveDate) -> StreakCounts {
    let mut dates: Vec<NaiveDate> = history.iter().map(|entry| entry.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some(newest) = dates.first().copied() else {
        return StreakCounts {
            current_streak: 0,
            longest_streak: 0,
        };
    };

    let mut run: u32 = 1;
    let mut longest: u32 = 1;
    let mut newest_run: Option<u32> = None;
    for pair in dates.windows(2) {
        if days_between(pair[1], pair[0]) == 1 {
            run += 1;
        } else {
            newest_run.get_or_insert(run);
            run = 1;
        }
        longest = longest.max(run);
    }
    let newest_run = newest_run.unwrap_or(run);

    let current_streak = if days_between(newest, today) <= 1 {
        newest_run
    } else {
        0
    };

    StreakCounts {
        current_streak,
        longest_streak: longest,
    }
}

//
// ─── MILESTONES ────────────────────────────────────────────────────────────────
//

/// A named streak length that raises the bonus multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakMilestone {
    pub days: u32,
    pub multiplier: f64,
    pub name: &'static str,
}

pub const STREAK_MILESTONES: [StreakMilestone; 7] = [
    StreakMilestone {
        days: 3,
        multiplier: 1.1,
        name: "Getting Started",
    },
    StreakMilestone {
        days: 7,
        multiplier: 1.25,
        name: "Week Warrior",
    },
    StreakMilestone {
        days: 14,
        multiplier: 1.5,
        name: "Fortnight Focus",
    },
    StreakMilestone {
        days: 30,
        multiplier: 1.75,
        name: "Monthly Master",
    },
    StreakMilestone {
        days: 60,
        multiplier: 2.0,
        name: "Dedicated Learner",
    },
    StreakMilestone {
        days: 100,
        multiplier: 2.5,
        name: "Century Club",
    },
    StreakMilestone {
        days: 365,
        multiplier: 3.0,
        name: "Year-Long Legend",
    },
];

/// Highest milestone reached by `streak`.
#[must_use]
pub fn current_milestone(streak: u32) -> Option<StreakMilestone> {
    STREAK_MILESTONES
        .iter()
        .rev()
        .find(|milestone| milestone.days <= streak)
        .copied()
}

/// First milestone not yet reached by `streak`.
#[must_use]
pub fn next_milestone(streak: u32) -> Option<StreakMilestone> {
    STREAK_MILESTONES
        .iter()
        .find(|milestone| milestone.days > streak)
        .copied()
}

#[must_use]
pub fn streak_bonus_multiplier(streak: u32) -> f64 {
    current_milestone(streak).map_or(1.0, |milestone| milestone.multiplier)
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Streak as seen on `today`, before any activity today is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakStatus {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub days_since_activity: Option<i64>,
    pub active_today: bool,
    pub at_risk: bool,
    pub lost: bool,
    pub multiplier: f64,
    pub milestone: Option<StreakMilestone>,
    pub next_milestone: Option<StreakMilestone>,
    pub days_to_next_milestone: Option<u32>,
}

#[must_use]
pub fn streak_status(data: &StreakData, today: NaiveDate) -> StreakStatus {
    let days_since_activity = data
        .last_activity_date
        .map(|last| days_between(last, today));
    let lost = days_since_activity.is_some_and(|gap| gap >= 2);
    let at_risk = days_since_activity == Some(1);
    let current_streak = if lost { 0 } else { data.current_streak };
    let next = next_milestone(current_streak);

    StreakStatus {
        current_streak,
        longest_streak: data.longest_streak,
        last_activity_date: data.last_activity_date,
        days_since_activity,
        active_today: days_since_activity == Some(0),
        at_risk,
        lost,
        multiplier: streak_bonus_multiplier(current_streak),
        milestone: current_milestone(current_streak),
        next_milestone: next,
        days_to_next_milestone: next.map(|milestone| milestone.days - current_streak),
    }
}
