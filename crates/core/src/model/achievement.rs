use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping used to present badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Milestone,
    Streak,
    Xp,
    Accuracy,
    Track,
    Speed,
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AchievementCategory::Milestone => "milestone",
            AchievementCategory::Streak => "streak",
            AchievementCategory::Xp => "xp",
            AchievementCategory::Accuracy => "accuracy",
            AchievementCategory::Track => "track",
            AchievementCategory::Speed => "speed",
        };
        f.write_str(name)
    }
}

/// A badge granted to the learner. Never revoked once granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub unlocked_at: DateTime<Utc>,
    pub category: AchievementCategory,
}

impl Achievement {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unlocked_at: DateTime<Utc>,
        category: AchievementCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unlocked_at,
            category,
        }
    }
}
