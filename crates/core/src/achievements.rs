//! Badge rules evaluated against the progress snapshot.

use chrono::{DateTime, Utc};

use crate::difficulty;
use crate::model::{Achievement, AchievementCategory, Difficulty, Track, UserProgress};

/// A badge and the condition that grants it.
pub struct AchievementRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub unlocked: fn(&UserProgress) -> bool,
}

impl std::fmt::Debug for AchievementRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementRule")
            .field("id", &self.id)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

fn completed_in(progress: &UserProgress, track: Track) -> u32 {
    progress.tracks().get(track).completed_count()
}

fn reached_advanced(progress: &UserProgress, track: Track) -> bool {
    let t = progress.tracks().get(track);
    difficulty::current_level(track, t.completed_count(), t.accuracy()) == Difficulty::Advanced
}

pub const ACHIEVEMENT_RULES: &[AchievementRule] = &[
    AchievementRule {
        id: "first-steps",
        name: "First Steps",
        description: "Answer your first question",
        category: AchievementCategory::Milestone,
        unlocked: |p| p.statistics().total_attempts >= 1,
    },
    AchievementRule {
        id: "warming-up",
        name: "Warming Up",
        description: "Answer 10 questions correctly",
        category: AchievementCategory::Milestone,
        unlocked: |p| p.statistics().correct_answers >= 10,
    },
    AchievementRule {
        id: "centurion",
        name: "Centurion",
        description: "Answer 100 questions",
        category: AchievementCategory::Milestone,
        unlocked: |p| p.statistics().total_attempts >= 100,
    },
    AchievementRule {
        id: "streak-3",
        name: "On a Roll",
        description: "Practice 3 days in a row",
        category: AchievementCategory::Streak,
        unlocked: |p| p.longest_streak() >= 3,
    },
    AchievementRule {
        id: "streak-7",
        name: "Week Warrior",
        description: "Practice 7 days in a row",
        category: AchievementCategory::Streak,
        unlocked: |p| p.longest_streak() >= 7,
    },
    AchievementRule {
        id: "streak-30",
        name: "Unstoppable",
        description: "Practice 30 days in a row",
        category: AchievementCategory::Streak,
        unlocked: |p| p.longest_streak() >= 30,
    },
    AchievementRule {
        id: "xp-100",
        name: "Point Collector",
        description: "Earn 100 XP",
        category: AchievementCategory::Xp,
        unlocked: |p| p.total_xp() >= 100,
    },
    AchievementRule {
        id: "xp-1000",
        name: "XP Hoarder",
        description: "Earn 1,000 XP",
        category: AchievementCategory::Xp,
        unlocked: |p| p.total_xp() >= 1_000,
    },
    AchievementRule {
        id: "xp-10000",
        name: "Legend",
        description: "Earn 10,000 XP",
        category: AchievementCategory::Xp,
        unlocked: |p| p.total_xp() >= 10_000,
    },
    AchievementRule {
        id: "flawless",
        name: "Flawless",
        description: "Keep 100% accuracy over your first 10 answers or more",
        category: AchievementCategory::Accuracy,
        unlocked: |p| p.statistics().total_attempts >= 10 && p.statistics().accuracy() >= 100.0,
    },
    AchievementRule {
        id: "sharpshooter",
        name: "Sharpshooter",
        description: "Hold 90% accuracy over at least 50 answers",
        category: AchievementCategory::Accuracy,
        unlocked: |p| p.statistics().total_attempts >= 50 && p.statistics().accuracy() >= 90.0,
    },
    AchievementRule {
        id: "speed-demon",
        name: "Speed Demon",
        description: "Answer 10 questions correctly in 10 seconds or less",
        category: AchievementCategory::Speed,
        unlocked: |p| p.statistics().fast_correct_answers >= 10,
    },
    AchievementRule {
        id: "html-explorer",
        name: "HTML Explorer",
        description: "Complete 10 HTML questions",
        category: AchievementCategory::Track,
        unlocked: |p| completed_in(p, Track::Html) >= 10,
    },
    AchievementRule {
        id: "css-explorer",
        name: "CSS Explorer",
        description: "Complete 10 CSS questions",
        category: AchievementCategory::Track,
        unlocked: |p| completed_in(p, Track::Css) >= 10,
    },
    AchievementRule {
        id: "javascript-explorer",
        name: "JavaScript Explorer",
        description: "Complete 10 JavaScript questions",
        category: AchievementCategory::Track,
        unlocked: |p| completed_in(p, Track::Javascript) >= 10,
    },
    AchievementRule {
        id: "html-master",
        name: "HTML Master",
        description: "Unlock advanced HTML",
        category: AchievementCategory::Track,
        unlocked: |p| reached_advanced(p, Track::Html),
    },
    AchievementRule {
        id: "css-master",
        name: "CSS Master",
        description: "Unlock advanced CSS",
        category: AchievementCategory::Track,
        unlocked: |p| reached_advanced(p, Track::Css),
    },
    AchievementRule {
        id: "javascript-master",
        name: "JavaScript Master",
        description: "Unlock advanced JavaScript",
        category: AchievementCategory::Track,
        unlocked: |p| reached_advanced(p, Track::Javascript),
    },
    AchievementRule {
        id: "polyglot",
        name: "Polyglot",
        description: "Complete a question in every track",
        category: AchievementCategory::Track,
        unlocked: |p| Track::ALL.into_iter().all(|t| completed_in(p, t) >= 1),
    },
    AchievementRule {
        id: "goal-getter",
        name: "Goal Getter",
        description: "Complete every daily goal in one day",
        category: AchievementCategory::Milestone,
        unlocked: |p| p.statistics().perfect_days >= 1,
    },
];

#[must_use]
pub fn rule(id: &str) -> Option<&'static AchievementRule> {
    ACHIEVEMENT_RULES.iter().find(|rule| rule.id == id)
}

/// Achievements whose rules hold now and that `progress` does not already have.
///
/// Never returns an id already present; callers append the result.
#[must_use]
pub fn evaluate(progress: &UserProgress, at: DateTime<Utc>) -> Vec<Achievement> {
    ACHIEVEMENT_RULES
        .iter()
        .filter(|rule| !progress.has_achievement(rule.id))
        .filter(|rule| (rule.unlocked)(progress))
        .map(|rule| Achievement::new(rule.id, rule.name, at, rule.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use std::collections::HashSet;

    #[test]
    fn rule_ids_are_unique() {
        let ids: HashSet<_> = ACHIEVEMENT_RULES.iter().map(|rule| rule.id).collect();
        assert_eq!(ids.len(), ACHIEVEMENT_RULES.len());
    }

    #[test]
    fn fresh_progress_unlocks_nothing() {
        let progress = UserProgress::new(fixed_now());
        assert!(evaluate(&progress, fixed_now()).is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let rule = rule("streak-7").unwrap();
        assert_eq!(rule.name, "Week Warrior");
        assert_eq!(rule.category, AchievementCategory::Streak);
        assert!(super::rule("nope").is_none());
    }
}
