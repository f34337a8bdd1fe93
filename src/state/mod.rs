pub mod darts;
pub mod game;
pub mod players;
pub mod prompt;
pub mod registry;
pub mod state_machine;
pub mod stats;

use std::{sync::Arc, time::SystemTime};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::AppConfig,
    dao::profile_store::ProfileStore,
    state::{
        game::{GameSession, SessionId},
        players::PlayerDatabase,
        prompt::{PromptSource, RandomPrompts},
        registry::{SessionHandle, SessionRegistry},
        stats::StatsTracker,
    },
};

pub use self::game::SessionError;

pub type SharedState = Arc<AppState>;

/// Builds the prompt source handed to each new session.
pub type PromptFactory = Box<dyn Fn() -> Box<dyn PromptSource> + Send + Sync>;

/// Central application state: the read-only player database, live sessions and profile stats.
pub struct AppState {
    config: AppConfig,
    players: Arc<PlayerDatabase>,
    sessions: SessionRegistry,
    stats: StatsTracker,
    prompts: PromptFactory,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        players: PlayerDatabase,
        profiles: Arc<dyn ProfileStore>,
    ) -> SharedState {
        Self::with_prompts(
            config,
            players,
            profiles,
            Box::new(|| Box::new(RandomPrompts::new(StdRng::from_os_rng()))),
        )
    }

    /// Same as [`AppState::new`] with a custom prompt source per session.
    pub fn with_prompts(
        config: AppConfig,
        players: PlayerDatabase,
        profiles: Arc<dyn ProfileStore>,
        prompts: PromptFactory,
    ) -> SharedState {
        Arc::new(Self {
            sessions: SessionRegistry::new(config.session_idle),
            players: Arc::new(players),
            stats: StatsTracker::new(profiles),
            prompts,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Player database shared read-only by every session.
    pub fn players(&self) -> &Arc<PlayerDatabase> {
        &self.players
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Register a fresh lobby session.
    pub fn create_session(&self, now: SystemTime) -> (SessionId, SessionHandle) {
        let players = self.players.clone();
        let prompts = (self.prompts)();
        let rules = self.config.rules;
        self.sessions
            .create(|id| GameSession::new(id, players, prompts, rules, now))
    }
}
