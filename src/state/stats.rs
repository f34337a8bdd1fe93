//! Per-user historical stats and achievements, fed by finished games.

use std::{collections::VecDeque, fmt, sync::Arc, time::SystemTime};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::dao::{
    models::{ProfileEntity, RecentGameEntity, StatsEntity},
    profile_store::ProfileStore,
    storage::StorageResult,
};

/// Number of games kept in a profile's recent-game log.
pub const RECENT_GAMES_LIMIT: usize = 10;

/// Outcome of one finished game for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub won: bool,
    pub final_score: i32,
    pub opponent_name: String,
    pub turns_played: u32,
    pub forfeited: bool,
}

impl GameResult {
    /// Checked out on exactly zero.
    pub fn is_perfect(&self) -> bool {
        self.won && self.final_score == 0
    }
}

/// Threshold-based badges a profile can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Won a first game.
    FirstWin,
    /// Played ten games.
    Veteran,
    /// Checked out on exactly zero.
    Perfectionist,
    /// Won five games.
    Champion,
    /// Average final score of 100 or less over at least five games.
    Sharpshooter,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstWin,
        Achievement::Veteran,
        Achievement::Perfectionist,
        Achievement::Champion,
        Achievement::Sharpshooter,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Achievement::FirstWin => "first_win",
            Achievement::Veteran => "veteran",
            Achievement::Perfectionist => "perfectionist",
            Achievement::Champion => "champion",
            Achievement::Sharpshooter => "sharpshooter",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|achievement| achievement.code() == code)
    }

    fn is_earned(self, stats: &PlayerStats) -> bool {
        match self {
            Achievement::FirstWin => stats.games_won >= 1,
            Achievement::Veteran => stats.games_played >= 10,
            Achievement::Perfectionist => stats.perfect_games >= 1,
            Achievement::Champion => stats.games_won >= 5,
            Achievement::Sharpshooter => {
                stats.games_played >= 5 && stats.average_score().is_some_and(|avg| avg <= 100.0)
            }
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Running aggregates over every recorded game.
///
/// Scores are remaining points, so lower is better; best and worst compare distance from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStats {
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

impl PlayerStats {
    pub fn record(&mut self, result: &GameResult) {
        self.games_played += 1;
        if result.won {
            self.games_won += 1;
        } else {
            self.games_lost += 1;
        }
        if result.forfeited {
            self.forfeits += 1;
        }
        if result.is_perfect() {
            self.perfect_games += 1;
        }

        self.total_score += i64::from(result.final_score);
        self.total_turns += u64::from(result.turns_played);

        let score = result.final_score;
        self.best_score = Some(match self.best_score {
            Some(best) if best.unsigned_abs() <= score.unsigned_abs() => best,
            _ => score,
        });
        self.worst_score = Some(match self.worst_score {
            Some(worst) if worst.unsigned_abs() >= score.unsigned_abs() => worst,
            _ => score,
        });
    }

    pub fn average_score(&self) -> Option<f64> {
        (self.games_played > 0).then(|| self.total_score as f64 / f64::from(self.games_played))
    }

    pub fn average_turns(&self) -> Option<f64> {
        (self.games_played > 0).then(|| self.total_turns as f64 / f64::from(self.games_played))
    }

    /// Share of games won, in `0.0..=1.0`.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.games_won) / f64::from(self.games_played)
    }
}

/// Finished game in the recent-game log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentGame {
    pub result: GameResult,
    pub finished_at: SystemTime,
}

/// Historical record of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub stats: PlayerStats,
    /// Oldest first, at most [`RECENT_GAMES_LIMIT`] entries.
    pub recent_games: VecDeque<RecentGame>,
    /// Unlock order.
    pub achievements: Vec<Achievement>,
    pub updated_at: SystemTime,
}

impl Profile {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, now: SystemTime) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            stats: PlayerStats::default(),
            recent_games: VecDeque::new(),
            achievements: Vec::new(),
            updated_at: now,
        }
    }

    /// Fold a finished game into the profile, returning achievements unlocked by it.
    pub fn record(&mut self, result: &GameResult, now: SystemTime) -> Vec<Achievement> {
        self.stats.record(result);

        self.recent_games.push_back(RecentGame {
            result: result.clone(),
            finished_at: now,
        });
        while self.recent_games.len() > RECENT_GAMES_LIMIT {
            self.recent_games.pop_front();
        }

        self.updated_at = now;

        let earned = Achievement::ALL
            .into_iter()
            .filter(|achievement| achievement.is_earned(&self.stats))
            .collect::<Vec<_>>();
        earned
            .into_iter()
            .filter(|&achievement| self.grant(achievement))
            .collect()
    }

    /// Add `achievement` unless already held.
    pub fn grant(&mut self, achievement: Achievement) -> bool {
        if self.achievements.contains(&achievement) {
            return false;
        }
        self.achievements.push(achievement);
        true
    }
}

impl From<ProfileEntity> for Profile {
    fn from(entity: ProfileEntity) -> Self {
        let stats = entity.stats;
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            stats: PlayerStats {
                games_played: stats.games_played,
                games_won: stats.games_won,
                games_lost: stats.games_lost,
                total_score: stats.total_score,
                best_score: stats.best_score,
                worst_score: stats.worst_score,
                total_turns: stats.total_turns,
                forfeits: stats.forfeits,
                perfect_games: stats.perfect_games,
            },
            recent_games: entity
                .recent_games
                .into_iter()
                .map(|game| RecentGame {
                    result: GameResult {
                        won: game.won,
                        final_score: game.final_score,
                        opponent_name: game.opponent_name,
                        turns_played: game.turns_played,
                        forfeited: game.forfeited,
                    },
                    finished_at: game.finished_at,
                })
                .collect(),
            achievements: entity
                .achievements
                .iter()
                .filter_map(|code| {
                    let achievement = Achievement::from_code(code);
                    if achievement.is_none() {
                        warn!(%code, "dropping unknown achievement code");
                    }
                    achievement
                })
                .collect(),
            updated_at: entity.updated_at,
        }
    }
}

impl From<&Profile> for ProfileEntity {
    fn from(profile: &Profile) -> Self {
        let stats = &profile.stats;
        Self {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            stats: StatsEntity {
                games_played: stats.games_played,
                games_won: stats.games_won,
                games_lost: stats.games_lost,
                total_score: stats.total_score,
                best_score: stats.best_score,
                worst_score: stats.worst_score,
                total_turns: stats.total_turns,
                forfeits: stats.forfeits,
                perfect_games: stats.perfect_games,
            },
            recent_games: profile
                .recent_games
                .iter()
                .map(|game| RecentGameEntity {
                    won: game.result.won,
                    final_score: game.result.final_score,
                    opponent_name: game.result.opponent_name.clone(),
                    turns_played: game.result.turns_played,
                    forfeited: game.result.forfeited,
                    finished_at: game.finished_at,
                })
                .collect(),
            achievements: profile
                .achievements
                .iter()
                .map(|achievement| achievement.code().to_owned())
                .collect(),
            updated_at: profile.updated_at,
        }
    }
}

/// Profile after a result was recorded.
#[derive(Debug, Clone)]
pub struct RecordedResult {
    pub profile: Profile,
    pub unlocked: Vec<Achievement>,
}

/// Folds game results into stored profiles.
#[derive(Clone)]
pub struct StatsTracker {
    store: Arc<dyn ProfileStore>,
    // Serialises read-modify-write cycles so concurrent games cannot lose updates.
    write_gate: Arc<Mutex<()>>,
}

impl StatsTracker {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub async fn profile(&self, user_id: &str) -> StorageResult<Option<Profile>> {
        Ok(self.store.find_profile(user_id).await?.map(Profile::from))
    }

    /// Record `result` for `user_id`, creating the profile on first use.
    pub async fn record_result(
        &self,
        user_id: &str,
        display_name: &str,
        result: &GameResult,
        now: SystemTime,
    ) -> StorageResult<RecordedResult> {
        let _guard = self.write_gate.lock().await;

        let mut profile = match self.store.find_profile(user_id).await? {
            Some(entity) => Profile::from(entity),
            None => {
                debug!(user_id, "creating profile");
                Profile::new(user_id, display_name, now)
            }
        };
        profile.display_name = display_name.to_owned();

        let unlocked = profile.record(result, now);
        self.store.save_profile(ProfileEntity::from(&profile)).await?;

        if !unlocked.is_empty() {
            info!(user_id, ?unlocked, "achievements unlocked");
        }

        Ok(RecordedResult { profile, unlocked })
    }
}
