use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One row of the player dataset produced by the offline scraper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Display name of the player.
    pub name: String,
    /// Nationality as recorded in the source table.
    pub country: String,
    /// Comma-separated list of clubs the player appeared for.
    pub clubs: String,
    /// Comma-separated list of position codes (e.g. `"DF, MF"`).
    #[serde(default)]
    pub position: String,
    /// Career appearance count.
    pub apps: u32,
}

/// Persisted user profile holding historical stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntity {
    /// External identifier of the user.
    pub user_id: String,
    /// Last display name the user played under.
    pub display_name: String,
    /// Running aggregates.
    pub stats: StatsEntity,
    /// Most recent games, newest last.
    pub recent_games: Vec<RecentGameEntity>,
    /// Achievement codes already unlocked.
    pub achievements: Vec<String>,
    /// Last time the profile was updated.
    pub updated_at: SystemTime,
}

/// Running aggregates stored on a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsEntity {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub total_score: i64,
    pub best_score: Option<i32>,
    pub worst_score: Option<i32>,
    pub total_turns: u64,
    pub forfeits: u32,
    pub perfect_games: u32,
}

/// One finished game as stored in the recent-games log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentGameEntity {
    pub won: bool,
    pub final_score: i32,
    pub opponent_name: String,
    pub turns_played: u32,
    pub forfeited: bool,
    pub finished_at: SystemTime,
}
