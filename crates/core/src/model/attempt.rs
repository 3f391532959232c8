use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::model::ids::QuestionId;
use crate::model::track::{Difficulty, Track};
use crate::time::calendar_day;

/// Longest plausible time on a single question; anything above is malformed input.
pub const MAX_TIME_SPENT_SECS: u32 = 86_400;

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw attempt as reported by the quiz runner, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDraft {
    pub question_id: String,
    pub track: String,
    pub difficulty: String,
    pub is_correct: bool,
    pub time_spent_secs: u32,
    pub timestamp: DateTime<Utc>,
    pub is_first_attempt: bool,
}

impl AttemptDraft {
    /// Validate the raw fields into a `QuestionAttempt`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for blank ids, unknown tracks or difficulties,
    /// and implausible timings.
    pub fn validate(self) -> Result<QuestionAttempt, ValidationError> {
        let question_id = QuestionId::new(self.question_id)?;
        let track = self.track.parse::<Track>()?;
        let difficulty = self.difficulty.parse::<Difficulty>()?;
        QuestionAttempt::new(
            question_id,
            track,
            difficulty,
            self.is_correct,
            self.time_spent_secs,
            self.timestamp,
            self.is_first_attempt,
        )
    }
}

//
// ─── QUESTION ATTEMPT ──────────────────────────────────────────────────────────
//

/// A single answered question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    question_id: QuestionId,
    track: Track,
    difficulty: Difficulty,
    is_correct: bool,
    time_spent_secs: u32,
    timestamp: DateTime<Utc>,
    is_first_attempt: bool,
}

impl QuestionAttempt {
    /// Create an attempt from already-typed fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::TimeSpentOutOfRange` if the timing exceeds
    /// `MAX_TIME_SPENT_SECS`.
    pub fn new(
        question_id: QuestionId,
        track: Track,
        difficulty: Difficulty,
        is_correct: bool,
        time_spent_secs: u32,
        timestamp: DateTime<Utc>,
        is_first_attempt: bool,
    ) -> Result<Self, ValidationError> {
        if time_spent_secs > MAX_TIME_SPENT_SECS {
            return Err(ValidationError::TimeSpentOutOfRange {
                provided: time_spent_secs,
                max: MAX_TIME_SPENT_SECS,
            });
        }

        Ok(Self {
            question_id,
            track,
            difficulty,
            is_correct,
            time_spent_secs,
            timestamp,
            is_first_attempt,
        })
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.track
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn is_first_attempt(&self) -> bool {
        self.is_first_attempt
    }

    /// Calendar day the attempt counts towards.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        calendar_day(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> AttemptDraft {
        AttemptDraft {
            question_id: "html-001".into(),
            track: "html".into(),
            difficulty: "beginner".into(),
            is_correct: true,
            time_spent_secs: 12,
            timestamp: fixed_now(),
            is_first_attempt: true,
        }
    }

    #[test]
    fn valid_draft_becomes_attempt() {
        let attempt = draft().validate().unwrap();
        assert_eq!(attempt.track(), Track::Html);
        assert_eq!(attempt.difficulty(), Difficulty::Beginner);
        assert_eq!(attempt.question_id().as_str(), "html-001");
        assert_eq!(attempt.day(), fixed_now().date_naive());
    }

    #[test]
    fn unknown_track_is_rejected() {
        let mut raw = draft();
        raw.track = "rust".into();
        assert_eq!(
            raw.validate().unwrap_err(),
            ValidationError::UnknownTrack("rust".into())
        );
    }

    #[test]
    fn blank_question_is_rejected() {
        let mut raw = draft();
        raw.question_id = " ".into();
        assert_eq!(raw.validate().unwrap_err(), ValidationError::EmptyQuestionId);
    }

    #[test]
    fn implausible_timing_is_rejected() {
        let mut raw = draft();
        raw.time_spent_secs = MAX_TIME_SPENT_SECS + 1;
        assert!(matches!(
            raw.validate().unwrap_err(),
            ValidationError::TimeSpentOutOfRange { .. }
        ));
    }
}
