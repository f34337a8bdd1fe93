//! Application-level configuration loading: data paths, game rules and session housekeeping.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::game::{BUST_FLOOR, DEFAULT_TURN_DURATION, GameRules, STARTING_SCORE};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FOOTBALL_DARTS_CONFIG_PATH";
/// Player dataset shipped next to the binary.
const DEFAULT_PLAYERS_PATH: &str = "players_pl.json";
/// Sessions untouched for this long are evicted on the next sweep.
const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(2 * 60 * 60);
/// Upper bound for a configured turn duration.
const MAX_TURN_DURATION: Duration = Duration::from_secs(60 * 60);
/// Maximum number of names returned by the candidate search.
const DEFAULT_SEARCH_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// JSON array of player records loaded at startup.
    pub players_path: PathBuf,
    /// Directory holding one JSON file per profile; in-memory profiles when unset.
    pub profiles_dir: Option<PathBuf>,
    pub rules: GameRules,
    pub session_idle: Duration,
    pub search_limit: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration stored at `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        players = %app_config.players_path.display(),
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    players_path: PathBuf,
    profiles_dir: Option<PathBuf>,
    starting_score: i32,
    bust_floor: i32,
    #[serde(rename = "turn_duration_secs")]
    #[serde_as(as = "DurationSeconds<u64>")]
    turn_duration: Duration,
    #[serde(rename = "session_idle_secs")]
    #[serde_as(as = "DurationSeconds<u64>")]
    session_idle: Duration,
    search_limit: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            players_path: PathBuf::from(DEFAULT_PLAYERS_PATH),
            profiles_dir: None,
            starting_score: STARTING_SCORE,
            bust_floor: BUST_FLOOR,
            turn_duration: DEFAULT_TURN_DURATION,
            session_idle: DEFAULT_SESSION_IDLE,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let starting_score = if value.starting_score > 0 {
            value.starting_score
        } else {
            warn!(value = value.starting_score, "starting score must be positive; using default");
            STARTING_SCORE
        };
        let bust_floor = if value.bust_floor <= 0 {
            value.bust_floor
        } else {
            warn!(value = value.bust_floor, "bust floor must not be positive; using default");
            BUST_FLOOR
        };
        let turn_duration = value.turn_duration.max(Duration::from_secs(1));
        let turn_duration = if turn_duration <= MAX_TURN_DURATION {
            turn_duration
        } else {
            warn!(
                secs = turn_duration.as_secs(),
                "turn duration longer than an hour; capping"
            );
            MAX_TURN_DURATION
        };

        Self {
            players_path: value.players_path,
            profiles_dir: value.profiles_dir,
            rules: GameRules {
                starting_score,
                bust_floor,
                turn_duration,
            },
            session_idle: value.session_idle,
            search_limit: value.search_limit,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
