//! Plain-text rendering for the terminal.

use std::fmt::Write;

use quest_core::xp::BonusValue;
use services::{AttemptOutcome, ProgressOverview};

pub fn attempt(outcome: &AttemptOutcome) -> String {
    let mut out = String::new();
    if let Some(reward) = &outcome.reward {
        let _ = writeln!(
            out,
            "+{} XP in {} ({} base, {} bonus)",
            reward.total_xp,
            reward.track.display_name(),
            reward.base_xp,
            reward.bonus_xp
        );
        for bonus in &reward.bonuses {
            let value = match bonus.value {
                BonusValue::Multiplier(m) => format!("x{m:.2}"),
                BonusValue::Flat(xp) => format!("+{xp}"),
            };
            let _ = writeln!(out, "  {:<18} {value}", bonus.kind.label());
        }
    }
    if outcome.leveled_up {
        let _ = writeln!(out, "Level up! You reached level {}.", outcome.level_after);
    }
    for goal in &outcome.completed_goals {
        let _ = writeln!(
            out,
            "Daily goal done: {} ({}/{}) +{} XP",
            goal.kind.description(),
            goal.current,
            goal.target,
            goal.bonus
        );
    }
    for achievement in &outcome.new_achievements {
        let _ = writeln!(out, "Achievement unlocked: {}", achievement.name);
    }
    let _ = writeln!(out, "Total XP: {}", outcome.total_xp);
    out
}

pub fn overview(view: &ProgressOverview) -> String {
    let mut out = String::new();
    let level = &view.level;
    let _ = writeln!(
        out,
        "Level {} {} | {} XP | {:.0}% to next ({} XP left)",
        level.current_level,
        level.level_name,
        view.xp.total_xp,
        level.progress_percentage,
        level.xp_to_next
    );

    let streak = &view.streak;
    let state = if streak.lost {
        "lost"
    } else if streak.at_risk {
        "at risk"
    } else if streak.active_today {
        "safe today"
    } else {
        "not started"
    };
    let _ = writeln!(
        out,
        "Streak: {} days ({state}), best {}, multiplier x{:.2}",
        streak.current_streak, streak.longest_streak, streak.multiplier
    );
    if let (Some(next), Some(days)) = (&streak.next_milestone, streak.days_to_next_milestone) {
        let _ = writeln!(out, "  {days} more days to {}", next.name);
    }

    let _ = writeln!(
        out,
        "Today ({}): {}/{} goals",
        view.daily.date,
        view.daily.completed_count(),
        view.daily.goals.len()
    );
    for goal in &view.daily.goals {
        let mark = if goal.completed { 'x' } else { ' ' };
        let _ = writeln!(
            out,
            "  [{mark}] {:<24} {}/{}",
            goal.kind.description(),
            goal.current,
            goal.target
        );
    }

    let _ = writeln!(out, "Tracks:");
    for (track, access) in view.tracks.iter().zip(&view.access) {
        if !access.unlocked {
            let requires = access
                .prerequisite
                .map_or("", |p| p.requires.display_name());
            let _ = writeln!(
                out,
                "  {:<11} locked, {} more {requires} questions",
                track.track.display_name(),
                access.remaining
            );
            continue;
        }
        let _ = writeln!(
            out,
            "  {:<11} {} XP, {} done, {:.0}% accuracy, {} tier ({:.0}% to next)",
            track.track.display_name(),
            track.progress.total_xp(),
            track.progress.completed_count(),
            track.progress.accuracy(),
            track.difficulty.current_level,
            track.difficulty.progress_to_next
        );
    }

    if !view.achievements.is_empty() {
        let names: Vec<&str> = view.achievements.iter().map(|a| a.name.as_str()).collect();
        let _ = writeln!(out, "Achievements: {}", names.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::{AttemptDraft, UserId};
    use quest_core::time::{fixed_clock, fixed_now};
    use services::AppServices;

    async fn one_answer() -> (AttemptOutcome, ProgressOverview) {
        let app = AppServices::in_memory(fixed_clock(), UserId::new(1));
        let svc = app.progress();
        let mut session = svc.open(app.user()).await;
        let outcome = svc
            .record_attempt(
                &mut session,
                AttemptDraft {
                    question_id: "html-forms-1".into(),
                    track: "html".into(),
                    difficulty: "beginner".into(),
                    is_correct: true,
                    time_spent_secs: 8,
                    timestamp: fixed_now(),
                    is_first_attempt: true,
                },
            )
            .await
            .unwrap();
        (outcome, svc.overview(&session))
    }

    #[tokio::test]
    async fn attempt_lists_bonuses_and_badges() {
        let (outcome, _) = one_answer().await;
        let text = attempt(&outcome);
        assert!(text.contains("XP in HTML"));
        assert!(text.contains("Speed bonus"));
        assert!(text.contains("First Steps"));
    }

    #[tokio::test]
    async fn overview_shows_locked_tracks() {
        let (_, view) = one_answer().await;
        let text = overview(&view);
        assert!(text.starts_with("Level 1 Novice"));
        assert!(text.contains("safe today"));
        assert!(text.contains("CSS         locked, 9 more HTML questions"));
        assert!(text.contains("JavaScript  locked, 10 more CSS questions"));
    }
}
