#![forbid(unsafe_code)]

//! Progress and gamification engine: XP, levels, streaks, difficulty tiers,
//! daily goals and achievements. Everything here is pure; persistence and
//! clocks live in the outer crates.

pub mod achievements;
pub mod daily_goal;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod level;
pub mod model;
pub mod projections;
pub mod streak;
pub mod time;
pub mod xp;

pub use engine::{ProgressEvent, Transition, replay, transition};
pub use error::ValidationError;
pub use time::Clock;
