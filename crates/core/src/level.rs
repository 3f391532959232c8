use serde::Serialize;

/// Cumulative XP needed to reach each level; index 0 is level 1.
pub const LEVEL_THRESHOLDS: [u64; 30] = [
    0, 100, 250, 450, 700, 1_000, 1_400, 1_900, 2_500, 3_200, 4_000, 5_000, 6_200, 7_600, 9_200,
    11_000, 13_000, 15_500, 18_500, 22_000, 26_000, 30_500, 35_500, 41_000, 47_000, 53_500,
    60_500, 68_000, 76_000, 85_000,
];

/// Levels per rank band.
pub const LEVELS_PER_RANK: u32 = 5;

/// Rank name and colour per band of `LEVELS_PER_RANK` levels.
pub const RANKS: [(&str, &str); 6] = [
    ("Novice", "#9ca3af"),
    ("Apprentice", "#22c55e"),
    ("Developer", "#3b82f6"),
    ("Engineer", "#a855f7"),
    ("Architect", "#f97316"),
    ("Master", "#eab308"),
];

#[must_use]
pub fn max_level() -> u32 {
    u32::try_from(LEVEL_THRESHOLDS.len()).unwrap_or(u32::MAX)
}

/// Where a learner stands for a given amount of XP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub current_level: u32,
    pub xp_to_next: u64,
    pub progress_percentage: f64,
    pub level_name: &'static str,
    pub level_color: &'static str,
}

/// Highest level whose threshold is at or below `total_xp`, never below 1.
#[must_use]
pub fn level_for_xp(total_xp: u64) -> u32 {
    let reached = LEVEL_THRESHOLDS
        .iter()
        .take_while(|threshold| **threshold <= total_xp)
        .count();
    u32::try_from(reached.max(1)).unwrap_or(u32::MAX)
}

/// Cumulative XP needed for `level`, or `None` beyond the table.
#[must_use]
pub fn xp_for_level(level: u32) -> Option<u64> {
    let index = usize::try_from(level.checked_sub(1)?).ok()?;
    LEVEL_THRESHOLDS.get(index).copied()
}

/// Rank name and colour for a level.
#[must_use]
pub fn rank_for_level(level: u32) -> (&'static str, &'static str) {
    let band = usize::try_from(level.saturating_sub(1) / LEVELS_PER_RANK).unwrap_or(usize::MAX);
    RANKS[band.min(RANKS.len() - 1)]
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_level_info(total_xp: u64) -> LevelInfo {
    let current_level = level_for_xp(total_xp);
    let (level_name, level_color) = rank_for_level(current_level);
    let floor = xp_for_level(current_level).unwrap_or(0);

    let (xp_to_next, progress_percentage) = match xp_for_level(current_level + 1) {
        Some(next) => {
            let span = next - floor;
            let into = total_xp.saturating_sub(floor);
            let pct = (into as f64 / span as f64 * 100.0).clamp(0.0, 100.0);
            (next.saturating_sub(total_xp), pct)
        }
        None => (0, 100.0),
    };

    LevelInfo {
        current_level,
        xp_to_next,
        progress_percentage,
        level_name,
        level_color,
    }
}
