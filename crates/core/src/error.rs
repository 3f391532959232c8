use chrono::NaiveDate;
use thiserror::Error;

/// Reasons an incoming event is refused before it touches any state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("question id cannot be empty")]
    EmptyQuestionId,

    #[error("unknown track: {0}")]
    UnknownTrack(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("time spent must be at most {max} seconds, got {provided}")]
    TimeSpentOutOfRange { provided: u32, max: u32 },

    #[error("attempt on {attempted} is older than last recorded activity on {last}")]
    OutOfOrder { attempted: NaiveDate, last: NaiveDate },

    #[error("daily goal must be between {min} and {max} XP, got {provided}")]
    DailyGoalOutOfRange { provided: u32, min: u32, max: u32 },
}
