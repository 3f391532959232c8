//! Difficulty-tier gating per track, plus the coarser gate between tracks.

use serde::Serialize;

use crate::model::{Difficulty, Track};

//
// ─── REQUIREMENTS ──────────────────────────────────────────────────────────────
//

/// What a learner must reach in a track to unlock a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierRequirement {
    pub questions_required: u32,
    pub accuracy_required: f64,
}

impl TierRequirement {
    pub const NONE: TierRequirement = TierRequirement {
        questions_required: 0,
        accuracy_required: 0.0,
    };

    /// Both the question count and the accuracy must be met.
    #[must_use]
    pub fn is_met(&self, completed: u32, accuracy: f64) -> bool {
        completed >= self.questions_required && accuracy >= self.accuracy_required
    }
}

/// The single source of truth for tier requirements: `(intermediate, advanced)` per track.
pub const TIER_REQUIREMENTS: [(Track, TierRequirement, TierRequirement); 3] = [
    (
        Track::Html,
        TierRequirement {
            questions_required: 15,
            accuracy_required: 70.0,
        },
        TierRequirement {
            questions_required: 35,
            accuracy_required: 80.0,
        },
    ),
    (
        Track::Css,
        TierRequirement {
            questions_required: 20,
            accuracy_required: 70.0,
        },
        TierRequirement {
            questions_required: 45,
            accuracy_required: 80.0,
        },
    ),
    (
        Track::Javascript,
        TierRequirement {
            questions_required: 25,
            accuracy_required: 75.0,
        },
        TierRequirement {
            questions_required: 60,
            accuracy_required: 85.0,
        },
    ),
];

#[must_use]
pub fn requirement(track: Track, difficulty: Difficulty) -> TierRequirement {
    let (_, intermediate, advanced) = TIER_REQUIREMENTS
        .iter()
        .find(|(t, _, _)| *t == track)
        .copied()
        .unwrap_or((track, TierRequirement::NONE, TierRequirement::NONE));
    match difficulty {
        Difficulty::Beginner => TierRequirement::NONE,
        Difficulty::Intermediate => intermediate,
        Difficulty::Advanced => advanced,
    }
}

#[must_use]
pub fn is_unlocked(track: Track, difficulty: Difficulty, completed: u32, accuracy: f64) -> bool {
    requirement(track, difficulty).is_met(completed, accuracy)
}

/// Highest tier whose requirements are met, else beginner.
#[must_use]
pub fn current_level(track: Track, completed: u32, accuracy: f64) -> Difficulty {
    Difficulty::ALL
        .into_iter()
        .rev()
        .find(|difficulty| is_unlocked(track, *difficulty, completed, accuracy))
        .unwrap_or(Difficulty::Beginner)
}

/// Weighted progress towards `next`, as a percentage: 70% questions, 30% accuracy.
#[must_use]
pub fn progress_towards(next: TierRequirement, completed: u32, accuracy: f64) -> f64 {
    let questions = if next.questions_required == 0 {
        1.0
    } else {
        (f64::from(completed) / f64::from(next.questions_required)).min(1.0)
    };
    let accuracy = if next.accuracy_required <= 0.0 {
        1.0
    } else {
        (accuracy / next.accuracy_required).clamp(0.0, 1.0)
    };
    (0.7 * questions + 0.3 * accuracy) * 100.0
}

//
// ─── PROGRESSION VIEW ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyProgression {
    pub track: Track,
    pub current_level: Difficulty,
    pub next_level: Option<Difficulty>,
    pub next_requirement: Option<TierRequirement>,
    pub progress_to_next: f64,
    pub unlocked_levels: Vec<Difficulty>,
    pub locked_levels: Vec<Difficulty>,
    pub completed: u32,
    pub accuracy: f64,
}

#[must_use]
pub fn resolve_progression(track: Track, completed: u32, accuracy: f64) -> DifficultyProgression {
    let current = current_level(track, completed, accuracy);
    let next_level = current.next();
    let next_requirement = next_level.map(|next| requirement(track, next));
    let progress_to_next =
        next_requirement.map_or(100.0, |next| progress_towards(next, completed, accuracy));

    let (unlocked_levels, locked_levels): (Vec<_>, Vec<_>) = Difficulty::ALL
        .into_iter()
        .partition(|difficulty| is_unlocked(track, *difficulty, completed, accuracy));

    DifficultyProgression {
        track,
        current_level: current,
        next_level,
        next_requirement,
        progress_to_next,
        unlocked_levels,
        locked_levels,
        completed,
        accuracy,
    }
}

//
// ─── TRACK PREREQUISITES ───────────────────────────────────────────────────────
//

/// Completed questions needed in an earlier track before a track opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackPrerequisite {
    pub requires: Track,
    pub completed_required: u32,
}

#[must_use]
pub fn track_prerequisite(track: Track) -> Option<TrackPrerequisite> {
    match track {
        Track::Html => None,
        Track::Css => Some(TrackPrerequisite {
            requires: Track::Html,
            completed_required: 10,
        }),
        Track::Javascript => Some(TrackPrerequisite {
            requires: Track::Css,
            completed_required: 10,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackAccess {
    pub track: Track,
    pub unlocked: bool,
    pub prerequisite: Option<TrackPrerequisite>,
    /// Completed questions still missing in the prerequisite track.
    pub remaining: u32,
}

/// Evaluate the track gate, independent of difficulty tiers.
#[must_use]
pub fn track_access(track: Track, completed_in: impl Fn(Track) -> u32) -> TrackAccess {
    let prerequisite = track_prerequisite(track);
    let remaining = prerequisite.map_or(0, |pre| {
        pre.completed_required
            .saturating_sub(completed_in(pre.requires))
    });
    TrackAccess {
        track,
        unlocked: remaining == 0,
        prerequisite,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_requirements_increase_per_track() {
        for (track, intermediate, advanced) in TIER_REQUIREMENTS {
            assert!(
                advanced.questions_required > intermediate.questions_required,
                "{track}"
            );
            assert!(advanced.accuracy_required >= intermediate.accuracy_required);
        }
    }

    #[test]
    fn html_intermediate_threshold() {
        assert_eq!(current_level(Track::Html, 15, 70.0), Difficulty::Intermediate);
        assert_eq!(current_level(Track::Html, 14, 70.0), Difficulty::Beginner);
        assert_eq!(current_level(Track::Html, 100, 69.9), Difficulty::Beginner);
        assert_eq!(current_level(Track::Html, 35, 80.0), Difficulty::Advanced);
    }

    #[test]
    fn progress_is_weighted() {
        let view = resolve_progression(Track::Html, 0, 0.0);
        assert!(view.progress_to_next.abs() < f64::EPSILON);

        // 7/15 questions and 35/70 accuracy
        let half = progress_towards(requirement(Track::Html, Difficulty::Intermediate), 7, 35.0);
        assert!((half - (0.7 * 7.0 / 15.0 + 0.15) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn max_tier_reports_full_progress() {
        let view = resolve_progression(Track::Css, 200, 95.0);
        assert_eq!(view.current_level, Difficulty::Advanced);
        assert_eq!(view.next_level, None);
        assert!((view.progress_to_next - 100.0).abs() < f64::EPSILON);
        assert!(view.locked_levels.is_empty());
    }

    #[test]
    fn unlocked_and_locked_partition_all_tiers() {
        let view = resolve_progression(Track::Javascript, 30, 80.0);
        assert_eq!(view.unlocked_levels, vec![Difficulty::Beginner, Difficulty::Intermediate]);
        assert_eq!(view.locked_levels, vec![Difficulty::Advanced]);
        assert_eq!(view.unlocked_levels.len() + view.locked_levels.len(), 3);
    }

    #[test]
    fn more_completions_never_lower_the_tier() {
        for track in Track::ALL {
            for accuracy in [0.0, 50.0, 70.0, 75.0, 80.0, 85.0, 100.0] {
                let mut previous = Difficulty::Beginner;
                for completed in 0..100 {
                    let level = current_level(track, completed, accuracy);
                    assert!(level >= previous);
                    previous = level;
                }
            }
        }
    }

    #[test]
    fn css_needs_ten_html_questions() {
        let locked = track_access(Track::Css, |t| if t == Track::Html { 9 } else { 0 });
        assert!(!locked.unlocked);
        assert_eq!(locked.remaining, 1);

        let open = track_access(Track::Css, |t| if t == Track::Html { 10 } else { 0 });
        assert!(open.unlocked);
        assert!(track_access(Track::Html, |_| 0).unlocked);
    }
}
