mod achievement;
mod attempt;
mod ids;
mod progress;
mod track;

pub use achievement::{Achievement, AchievementCategory};
pub use attempt::{AttemptDraft, MAX_TIME_SPENT_SECS, QuestionAttempt};
pub use ids::{QuestionId, UserId};
pub use progress::{
    DEFAULT_DAILY_GOAL_XP, DifficultyTally, FAST_ANSWER_SECS, Statistics, TrackProgress, Tracks,
    UserProgress,
};
pub use track::{Difficulty, Track};
