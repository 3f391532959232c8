//! XP awarded for a single answered question.
//!
//! All multipliers are applied to an unrounded running value and the result is
//! rounded exactly once, so the same inputs always give the same reward.

use serde::Serialize;

use crate::model::{Difficulty, Track};

const CORRECT_BASE_XP: f64 = 10.0;
const INCORRECT_BASE_XP: f64 = 2.0;

/// `(max seconds, multiplier)`, ascending; the first tier that fits wins.
pub const TIME_BONUS_TIERS: [(u32, f64); 4] = [(10, 1.5), (20, 1.3), (30, 1.2), (60, 1.1)];

/// `(min streak days, multiplier)`, descending; the first tier that fits wins.
pub const STREAK_BONUS_TIERS: [(u32, f64); 4] = [(50, 1.5), (20, 1.3), (10, 1.2), (5, 1.1)];

pub const PERFECT_ACCURACY_BONUS_XP: u32 = 5;
pub const FIRST_ATTEMPT_BONUS_XP: u32 = 3;

//
// ─── REWARD TYPES ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Speed,
    Streak,
    PerfectAccuracy,
    FirstAttempt,
}

impl BonusKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BonusKind::Speed => "Speed bonus",
            BonusKind::Streak => "Streak bonus",
            BonusKind::PerfectAccuracy => "Perfect accuracy",
            BonusKind::FirstAttempt => "First try",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusValue {
    Multiplier(f64),
    Flat(u32),
}

/// One bonus that contributed to a reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XpBonus {
    pub kind: BonusKind,
    pub value: BonusValue,
}

/// Breakdown of the XP granted for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XpReward {
    pub track: Track,
    pub base_xp: u32,
    pub bonus_xp: u32,
    pub total_xp: u32,
    pub bonuses: Vec<XpBonus>,
}

//
// ─── CALCULATOR ────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn difficulty_factor(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Beginner => 1.0,
        Difficulty::Intermediate => 1.5,
        Difficulty::Advanced => 2.0,
    }
}

/// Multiplier for answering in `time_spent_secs`; 1.0 when slower than every tier.
#[must_use]
pub fn time_bonus_multiplier(time_spent_secs: u32) -> f64 {
    TIME_BONUS_TIERS
        .iter()
        .find(|(max_secs, _)| time_spent_secs <= *max_secs)
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

/// Multiplier for an ongoing streak of `streak_days`; 1.0 below the lowest tier.
#[must_use]
pub fn streak_bonus_tier(streak_days: u32) -> f64 {
    STREAK_BONUS_TIERS
        .iter()
        .find(|(min_days, _)| streak_days >= *min_days)
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_xp(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Compute the reward for one attempt.
///
/// `accuracy` is the learner's accuracy in `track` (0–100) before this attempt
/// and `current_streak` the day streak before it.
///
/// ```
/// # use quest_core::model::{Difficulty, Track};
/// # use quest_core::xp::calculate_xp_reward;
/// let reward = calculate_xp_reward(true, 5, Difficulty::Beginner, 0, 0.0, true, Track::Html);
/// assert_eq!(reward.total_xp, 18);
/// ```
#[must_use]
pub fn calculate_xp_reward(
    is_correct: bool,
    time_spent_secs: u32,
    difficulty: Difficulty,
    current_streak: u32,
    accuracy: f64,
    is_first_attempt: bool,
    track: Track,
) -> XpReward {
    let base = if is_correct {
        CORRECT_BASE_XP
    } else {
        INCORRECT_BASE_XP
    };
    let scaled_base = base * difficulty_factor(difficulty);

    let mut value = scaled_base;
    let mut bonuses = Vec::new();

    if is_correct {
        let speed = time_bonus_multiplier(time_spent_secs);
        if speed > 1.0 {
            value *= speed;
            bonuses.push(XpBonus {
                kind: BonusKind::Speed,
                value: BonusValue::Multiplier(speed),
            });
        }

        let streak = streak_bonus_tier(current_streak);
        if streak > 1.0 {
            value *= streak;
            bonuses.push(XpBonus {
                kind: BonusKind::Streak,
                value: BonusValue::Multiplier(streak),
            });
        }

        if accuracy >= 100.0 {
            value += f64::from(PERFECT_ACCURACY_BONUS_XP);
            bonuses.push(XpBonus {
                kind: BonusKind::PerfectAccuracy,
                value: BonusValue::Flat(PERFECT_ACCURACY_BONUS_XP),
            });
        }

        if is_first_attempt {
            value += f64::from(FIRST_ATTEMPT_BONUS_XP);
            bonuses.push(XpBonus {
                kind: BonusKind::FirstAttempt,
                value: BonusValue::Flat(FIRST_ATTEMPT_BONUS_XP),
            });
        }
    }

    let base_xp = round_xp(scaled_base);
    let total_xp = round_xp(value).max(base_xp);

    XpReward {
        track,
        base_xp,
        bonus_xp: total_xp - base_xp,
        total_xp,
        bonuses,
    }
}
