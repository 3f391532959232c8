//! The progress reducer: one event in, one new `UserProgress` out.

use chrono::{DateTime, Utc};

use crate::achievements;
use crate::daily_goal::{DailyGoal, DailyProgress};
use crate::error::ValidationError;
use crate::level::level_for_xp;
use crate::model::{Achievement, QuestionAttempt, UserProgress};
use crate::streak::{DayActivity, streak_status};
use crate::xp::{XpReward, calculate_xp_reward};

/// Accepted bounds for a learner's daily XP goal.
pub const DAILY_GOAL_RANGE: (u32, u32) = (10, 1_000);

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A question was answered.
    AnswerRecorded(QuestionAttempt),
    /// The learner picked a new daily XP goal; it applies from the next fresh goal sheet.
    DailyGoalChanged { xp_target: u32 },
    /// Start over. Earned achievements and the daily goal setting are kept.
    Reset { at: DateTime<Utc> },
}

/// Everything that changed in one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub progress: UserProgress,
    pub reward: Option<XpReward>,
    pub level_before: u32,
    pub level_after: u32,
    pub new_achievements: Vec<Achievement>,
    pub completed_goals: Vec<DailyGoal>,
}

impl Transition {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }

    fn unchanged_level(progress: UserProgress) -> Self {
        let level = level_for_xp(progress.total_xp);
        Self {
            progress,
            reward: None,
            level_before: level,
            level_after: level,
            new_achievements: Vec::new(),
            completed_goals: Vec::new(),
        }
    }
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Apply one event to `state`, returning the new state.
///
/// `state` itself is never touched; a rejected event leaves the caller with
/// exactly what it had.
///
/// # Errors
///
/// Returns `ValidationError` if the event is out of order or out of range.
pub fn transition(
    state: &UserProgress,
    event: &ProgressEvent,
) -> Result<Transition, ValidationError> {
    match event {
        ProgressEvent::AnswerRecorded(attempt) => record_answer(state, attempt),
        ProgressEvent::DailyGoalChanged { xp_target } => {
            let (min, max) = DAILY_GOAL_RANGE;
            if !(min..=max).contains(xp_target) {
                return Err(ValidationError::DailyGoalOutOfRange {
                    provided: *xp_target,
                    min,
                    max,
                });
            }
            let mut next = state.clone();
            next.daily_goal = *xp_target;
            Ok(Transition::unchanged_level(next))
        }
        ProgressEvent::Reset { at } => {
            let mut next = UserProgress::new(*at);
            next.daily_goal = state.daily_goal;
            next.achievements = state.achievements.clone();
            let mut result = Transition::unchanged_level(next);
            result.level_before = level_for_xp(state.total_xp);
            Ok(result)
        }
    }
}

fn record_answer(
    state: &UserProgress,
    attempt: &QuestionAttempt,
) -> Result<Transition, ValidationError> {
    let today = attempt.day();
    match state.streak.last_activity_date {
        Some(last) if today < last => {
            return Err(ValidationError::OutOfOrder {
                attempted: today,
                last,
            });
        }
        _ => {}
    }

    // A lapsed streak counts as zero until this attempt restarts it.
    let streak_before = streak_status(&state.streak, today).current_streak;
    let track_before = state.tracks.get(attempt.track());
    let reward = calculate_xp_reward(
        attempt.is_correct(),
        attempt.time_spent_secs(),
        attempt.difficulty(),
        streak_before,
        track_before.accuracy(),
        attempt.is_first_attempt(),
        attempt.track(),
    );

    let mut next = state.clone();
    let activity = DayActivity {
        xp_earned: reward.total_xp,
        questions_answered: 1,
        time_spent_secs: attempt.time_spent_secs(),
        track: attempt.track(),
    };

    next.streak.record_activity(today, &activity);
    next.tracks
        .get_mut(attempt.track())
        .apply_attempt(attempt, reward.total_xp);
    next.statistics.record(attempt);
    next.total_xp += u64::from(reward.total_xp);

    let mut daily = match next.daily.take() {
        Some(daily) if daily.date == today => daily,
        _ => DailyProgress::start(today, &next.streak.streak_history, next.daily_goal),
    };
    let was_perfect = daily.all_completed();
    let completed_goals = daily.record(&activity);
    let goal_bonus: u64 = completed_goals.iter().map(|goal| u64::from(goal.bonus)).sum();
    next.total_xp += goal_bonus;
    next.statistics.bonus_xp_earned += goal_bonus;
    if daily.all_completed() && !was_perfect {
        next.statistics.perfect_days = next.statistics.perfect_days.saturating_add(1);
    }
    next.daily = Some(daily);

    let new_achievements = achievements::evaluate(&next, attempt.timestamp());
    next.achievements.extend(new_achievements.iter().cloned());

    Ok(Transition {
        level_before: level_for_xp(state.total_xp),
        level_after: level_for_xp(next.total_xp),
        progress: next,
        reward: Some(reward),
        new_achievements,
        completed_goals,
    })
}

/// Fold a sequence of events, stopping at the first rejection.
///
/// # Errors
///
/// Returns the first `ValidationError` encountered.
pub fn replay<'a>(
    initial: UserProgress,
    events: impl IntoIterator<Item = &'a ProgressEvent>,
) -> Result<UserProgress, ValidationError> {
    events
        .into_iter()
        .try_fold(initial, |state, event| {
            transition(&state, event).map(|t| t.progress)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily_goal::GoalKind;
    use crate::model::{AttemptDraft, Difficulty, Track};
    use crate::streak::recompute;
    use crate::xp::BonusKind;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn answer(
        id: &str,
        track: &str,
        difficulty: &str,
        correct: bool,
        secs: u32,
        at: DateTime<Utc>,
    ) -> ProgressEvent {
        ProgressEvent::AnswerRecorded(
            AttemptDraft {
                question_id: id.into(),
                track: track.into(),
                difficulty: difficulty.into(),
                is_correct: correct,
                time_spent_secs: secs,
                timestamp: at,
                is_first_attempt: true,
            }
            .validate()
            .unwrap(),
        )
    }

    #[test]
    fn first_answer_of_a_fresh_learner() {
        let state = UserProgress::new(start());
        let result = transition(&state, &answer("html-1", "html", "beginner", true, 5, start()))
            .unwrap();

        let reward = result.reward.as_ref().unwrap();
        assert_eq!(reward.total_xp, 18);
        assert_eq!(result.progress.current_streak(), 1);
        assert_eq!(result.progress.tracks().html.completed_count(), 1);
        assert!(result.progress.has_achievement("first-steps"));
        assert!(result.completed_goals.iter().any(|g| g.kind == GoalKind::Streak));
        // 18 XP plus the streak goal bonus
        assert_eq!(result.progress.total_xp(), 18 + 5);
        assert_eq!(state.total_xp(), 0);
    }

    #[test]
    fn out_of_order_attempt_is_rejected_without_mutation() {
        let state = UserProgress::new(start());
        let later = transition(
            &state,
            &answer("html-1", "html", "beginner", true, 5, start() + Duration::days(2)),
        )
        .unwrap()
        .progress;

        let err = transition(&later, &answer("html-2", "html", "beginner", true, 5, start()))
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfOrder { .. }));
        assert_eq!(later.statistics().total_attempts, 1);
    }

    #[test]
    fn earlier_time_on_the_same_day_is_accepted() {
        let state = UserProgress::new(start());
        let noon = start() + Duration::hours(3);
        let first = transition(&state, &answer("html-1", "html", "beginner", true, 5, noon))
            .unwrap()
            .progress;

        let morning = transition(&first, &answer("html-2", "html", "beginner", true, 5, start()))
            .unwrap()
            .progress;
        assert_eq!(morning.statistics().total_attempts, 2);
        assert_eq!(morning.current_streak(), 1);
    }

    #[test]
    fn daily_xp_goal_awards_bonus_once() {
        let mut state = UserProgress::new(start());
        let mut bonus_goals = Vec::new();
        for i in 0..10 {
            let result = transition(
                &state,
                &answer(&format!("html-{i}"), "html", "beginner", true, 90, start()),
            )
            .unwrap();
            bonus_goals.extend(result.completed_goals.iter().map(|g| g.kind));
            state = result.progress;
        }

        let xp_goals = bonus_goals.iter().filter(|k| **k == GoalKind::Xp).count();
        assert_eq!(xp_goals, 1);
        let daily = state.daily().unwrap();
        let xp_goal = daily.goal(GoalKind::Xp).unwrap();
        assert_eq!(xp_goal.target, 50);
        assert!(xp_goal.completed);
        assert_eq!(xp_goal.bonus, 5);
        assert_eq!(
            state.total_xp(),
            daily.xp_earned + state.statistics().bonus_xp_earned
        );
    }

    #[test]
    fn new_day_starts_new_goal_sheet() {
        let state = UserProgress::new(start());
        let day_one =
            transition(&state, &answer("css-1", "css", "beginner", true, 20, start())).unwrap();
        let day_two = transition(
            &day_one.progress,
            &answer("css-2", "css", "beginner", true, 20, start() + Duration::days(1)),
        )
        .unwrap();

        let daily = day_two.progress.daily().unwrap();
        assert_eq!(daily.date, (start() + Duration::days(1)).date_naive());
        assert_eq!(daily.questions_answered, 1);
        assert_eq!(day_two.progress.current_streak(), 2);
        assert_eq!(day_two.progress.tracks().css.current_streak(), 2);
    }

    #[test]
    fn wrong_answers_lower_accuracy_but_not_xp() {
        let mut state = UserProgress::new(start());
        let mut last_xp = 0;
        for (i, correct) in [true, false, false, true].into_iter().enumerate() {
            state = transition(
                &state,
                &answer(&format!("js-{i}"), "javascript", "advanced", correct, 40, start()),
            )
            .unwrap()
            .progress;
            assert!(state.total_xp() >= last_xp);
            last_xp = state.total_xp();
        }
        let js = &state.tracks().javascript;
        assert!((js.accuracy() - 50.0).abs() < 1e-9);
        assert_eq!(js.completed_count(), 2);
        assert_eq!(js.tally(Difficulty::Advanced).attempts, 4);
    }

    #[test]
    fn daily_goal_change_is_validated() {
        let state = UserProgress::new(start());
        let err = transition(&state, &ProgressEvent::DailyGoalChanged { xp_target: 5 })
            .unwrap_err();
        assert!(matches!(err, ValidationError::DailyGoalOutOfRange { .. }));

        let ok = transition(&state, &ProgressEvent::DailyGoalChanged { xp_target: 120 })
            .unwrap();
        assert_eq!(ok.progress.daily_goal(), 120);
    }

    #[test]
    fn reset_clears_progress_but_keeps_badges() {
        let state = UserProgress::new(start());
        let played = replay(
            state,
            &[
                ProgressEvent::DailyGoalChanged { xp_target: 80 },
                answer("html-1", "html", "beginner", true, 5, start()),
            ],
        )
        .unwrap();
        assert!(played.total_xp() > 0);

        let reset = transition(&played, &ProgressEvent::Reset { at: start() }).unwrap();
        assert_eq!(reset.progress.total_xp(), 0);
        assert_eq!(reset.progress.daily_goal(), 80);
        assert_eq!(reset.progress.achievements(), played.achievements());
        assert_eq!(reset.progress.tracks().html.completed_count(), 0);
    }

    #[test]
    fn achievements_only_accumulate() {
        let mut state = UserProgress::new(start());
        let mut seen: Vec<String> = Vec::new();
        for i in 0..40 {
            let correct = i % 3 != 0;
            let at = start() + Duration::days(i64::from(i / 4));
            let event = answer(&format!("html-{i}"), "html", "beginner", correct, 8, at);
            state = transition(&state, &event).unwrap().progress;

            let ids: Vec<String> = state.achievements().iter().map(|a| a.id.clone()).collect();
            assert!(ids.len() >= seen.len());
            assert_eq!(&ids[..seen.len()], &seen[..]);
            seen = ids;
        }
        assert!(state.has_achievement("streak-7"));
        assert!(state.has_achievement("html-explorer"));
    }

    #[test]
    fn streak_history_matches_incremental_counters() {
        let offsets = [0, 0, 1, 3, 4, 5, 5, 9, 10];
        let mut state = UserProgress::new(start());
        for (i, offset) in offsets.into_iter().enumerate() {
            let at = start() + Duration::days(offset);
            let event = answer(&format!("css-{i}"), "css", "beginner", true, 15, at);
            state = transition(&state, &event).unwrap().progress;
            let counts = recompute(&state.streak().streak_history, at.date_naive());
            assert_eq!(counts.current_streak, state.current_streak());
            assert_eq!(counts.longest_streak, state.longest_streak());
        }
        assert_eq!(state.longest_streak(), 3);
        assert!(state.current_streak() <= state.longest_streak());
        assert_eq!(state.tracks().get(Track::Css).longest_streak(), 3);
    }

    #[test]
    fn lapsed_streak_earns_no_streak_bonus() {
        let mut state = UserProgress::new(start());
        for day in 0..50 {
            let at = start() + Duration::days(day);
            let event = answer(&format!("html-{day}"), "html", "beginner", true, 90, at);
            state = transition(&state, &event).unwrap().progress;
        }
        assert_eq!(state.current_streak(), 50);

        let next_day = start() + Duration::days(50);
        let event = answer("html-kept", "html", "beginner", true, 90, next_day);
        let kept = transition(&state, &event).unwrap();
        let reward = kept.reward.unwrap();
        assert!(reward.bonuses.iter().any(|b| b.kind == BonusKind::Streak));
        assert_eq!(reward.total_xp, 23);

        let much_later = start() + Duration::days(79);
        let event = answer("html-back", "html", "beginner", true, 90, much_later);
        let lapsed = transition(&state, &event).unwrap();
        let reward = lapsed.reward.unwrap();
        assert!(reward.bonuses.iter().all(|b| b.kind != BonusKind::Streak));
        assert_eq!(reward.total_xp, 18);
        assert_eq!(lapsed.progress.current_streak(), 1);
        assert_eq!(lapsed.progress.longest_streak(), 50);
    }
}
