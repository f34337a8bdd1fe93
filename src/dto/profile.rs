use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::stats::{Achievement, PlayerStats, Profile, RecentGame},
};

/// Historical stats of one user.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: String,
    pub display_name: String,
    pub stats: StatsSummary,
    /// Newest first.
    pub recent_games: Vec<RecentGameSummary>,
    pub achievements: Vec<Achievement>,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsSummary {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub win_rate: f64,
    pub total_score: i64,
    pub average_score: Option<f64>,
    pub best_score: Option<i32>,
    pub worst_score: Option<i32>,
    pub total_turns: u64,
    pub average_turns: Option<f64>,
    pub forfeits: u32,
    pub perfect_games: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentGameSummary {
    pub won: bool,
    pub final_score: i32,
    pub opponent_name: String,
    pub turns_played: u32,
    pub forfeited: bool,
    pub finished_at: String,
}

impl From<&PlayerStats> for StatsSummary {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            games_played: stats.games_played,
            games_won: stats.games_won,
            games_lost: stats.games_lost,
            win_rate: stats.win_rate(),
            total_score: stats.total_score,
            average_score: stats.average_score(),
            best_score: stats.best_score,
            worst_score: stats.worst_score,
            total_turns: stats.total_turns,
            average_turns: stats.average_turns(),
            forfeits: stats.forfeits,
            perfect_games: stats.perfect_games,
        }
    }
}

impl From<&RecentGame> for RecentGameSummary {
    fn from(game: &RecentGame) -> Self {
        Self {
            won: game.result.won,
            final_score: game.result.final_score,
            opponent_name: game.result.opponent_name.clone(),
            turns_played: game.result.turns_played,
            forfeited: game.result.forfeited,
            finished_at: format_system_time(game.finished_at),
        }
    }
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            stats: StatsSummary::from(&profile.stats),
            recent_games: profile
                .recent_games
                .iter()
                .rev()
                .map(RecentGameSummary::from)
                .collect(),
            achievements: profile.achievements.clone(),
            updated_at: format_system_time(profile.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::state::stats::GameResult;

    #[test]
    fn recent_games_are_listed_newest_first() {
        let mut profile = Profile::new("u1", "Ada", UNIX_EPOCH);
        for (secs, score) in [(10, 120), (20, 0)] {
            profile.record(
                &GameResult {
                    won: score == 0,
                    final_score: score,
                    opponent_name: "Bob".into(),
                    turns_played: 5,
                    forfeited: false,
                },
                UNIX_EPOCH + Duration::from_secs(secs),
            );
        }

        let response = ProfileResponse::from(&profile);
        assert_eq!(response.recent_games[0].final_score, 0);
        assert_eq!(response.recent_games[1].finished_at, "1970-01-01T00:00:10Z");
        assert_eq!(response.stats.win_rate, 0.5);
        assert_eq!(response.stats.average_score, Some(60.0));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["achievements"], serde_json::json!(["first_win", "perfectionist"]));
    }
}
