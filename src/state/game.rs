//! Per-session game state: seats, scores, turn order and the guess validation pipeline.

use std::{
    borrow::Cow,
    fmt,
    sync::Arc,
    time::{Duration, SystemTime},
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::state::{
    darts::{DartScoreValidator, MAX_VISIT_SCORE},
    players::{NameSet, PlayerDatabase, PlayerInfo, PlayerRecord},
    prompt::{Prompt, PromptSource},
    state_machine::{LifecycleEvent, SessionLifecycle, SessionPhase},
    stats::GameResult,
};

/// Score every player starts a game with.
pub const STARTING_SCORE: i32 = 501;
/// Lowest score a guess may leave; anything below forfeits the turn.
pub const BUST_FLOOR: i32 = -20;
/// Time each player has to answer before the turn can be forfeited.
pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(60);
/// Name recorded in the history when a turn runs out of time.
pub const TIMEOUT_ENTRY: &str = "Timeout";

/// Identifier of a session inside the registry.
pub type SessionId = String;

/// Errors raised by session operations. Forfeits are not errors; see [`GuessOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session `{0}` not found")]
    NotFound(SessionId),
    #[error("session is full")]
    Full,
    #[error("game has not started yet")]
    NotStarted,
    #[error("it is not slot {0}'s turn")]
    NotYourTurn(usize),
    #[error("{0}")]
    InvalidInput(String),
    #[error("user `{0}` is not seated in this session")]
    NotAPlayer(String),
}

/// Tunable game constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub starting_score: i32,
    pub bust_floor: i32,
    pub turn_duration: Duration,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_score: STARTING_SCORE,
            bust_floor: BUST_FLOOR,
            turn_duration: DEFAULT_TURN_DURATION,
        }
    }
}

/// One of the two seats of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Name shown to both players.
    pub display_name: String,
    /// External user identifier, when the player is signed in.
    pub user_id: Option<String>,
    /// Remaining score for the current game.
    pub score: i32,
    /// Accepted guesses in the current game.
    pub turns: u32,
}

impl PlayerSlot {
    fn new(display_name: String, user_id: Option<String>, starting_score: i32) -> Self {
        Self {
            display_name,
            user_id,
            score: starting_score,
            turns: 0,
        }
    }
}

/// Result of a single turn as recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnResult {
    /// Guess accepted; the appearance count was thrown.
    Appearances(u32),
    /// The turn was forfeited.
    Forfeit,
}

/// Entry of a slot's append-only turn history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnHistoryEntry {
    pub guessed_name: String,
    pub result: TurnResult,
}

/// Why a turn was forfeited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitReason {
    AlreadyPicked,
    NotValidForPrompt,
    TooManyAppearances,
    InvalidDartScore,
    /// The guess would have taken the score under the configured floor.
    BelowFloor { floor: i32 },
    Timeout,
}

impl ForfeitReason {
    /// Human-readable explanation shown to the players.
    pub fn message(self) -> Cow<'static, str> {
        let text = match self {
            ForfeitReason::AlreadyPicked => "Player has already been picked. Turn forfeited.",
            ForfeitReason::NotValidForPrompt => "Player not valid for this prompt. Turn forfeited.",
            ForfeitReason::TooManyAppearances => {
                "Player has more than 180 appearances. Turn forfeited."
            }
            ForfeitReason::InvalidDartScore => {
                "Appearances are an invalid darts score. Turn forfeited."
            }
            ForfeitReason::BelowFloor { floor } => {
                return Cow::Owned(format!(
                    "Guess rejected: score would go below {floor}. Turn forfeited."
                ));
            }
            ForfeitReason::Timeout => "Time's up! Turn forfeited.",
        };
        Cow::Borrowed(text)
    }
}

impl fmt::Display for ForfeitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Game result of one seated player, ready to be handed to the stats tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatResult {
    pub user_id: Option<String>,
    pub display_name: String,
    pub result: GameResult,
}

/// Transition produced by a guess or a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The turn passed to the opponent without a score change.
    Forfeited {
        reason: ForfeitReason,
        player: Option<PlayerInfo>,
    },
    /// The guess was thrown; the turn passed to the opponent.
    Accepted {
        appearances: u32,
        score: i32,
        player: PlayerInfo,
    },
    /// The guesser checked out. The session already restarted with fresh scores.
    Won {
        slot: usize,
        winner: String,
        appearances: u32,
        final_score: i32,
        player: PlayerInfo,
        results: Vec<SeatResult>,
    },
}

/// What happened to the session when a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The host left; the session must be dropped.
    Closed { forfeit: Option<SeatResult> },
    /// The guest left; the session waits for a new opponent.
    ReturnedToLobby { forfeit: Option<SeatResult> },
}

impl LeaveOutcome {
    pub fn forfeit(&self) -> Option<&SeatResult> {
        match self {
            LeaveOutcome::Closed { forfeit } | LeaveOutcome::ReturnedToLobby { forfeit } => {
                forfeit.as_ref()
            }
        }
    }
}

/// A two-player game. All mutation goes through `&mut self`; callers serialise access.
pub struct GameSession {
    id: SessionId,
    players: Arc<PlayerDatabase>,
    prompts: Box<dyn PromptSource>,
    validator: &'static DartScoreValidator,
    rules: GameRules,
    lifecycle: SessionLifecycle,
    slots: [Option<PlayerSlot>; 2],
    active_turn: usize,
    prompt: Option<Prompt>,
    history: [Vec<TurnHistoryEntry>; 2],
    selected: NameSet,
    message: String,
    turn_deadline: Option<SystemTime>,
    created_at: SystemTime,
    last_activity: SystemTime,
    version: u64,
}

impl GameSession {
    /// Build an empty session in the lobby with a first prompt already drawn.
    pub fn new(
        id: SessionId,
        players: Arc<PlayerDatabase>,
        mut prompts: Box<dyn PromptSource>,
        rules: GameRules,
        now: SystemTime,
    ) -> Self {
        let prompt = prompts.next_prompt(players.vocabulary());
        Self {
            id,
            players,
            prompts,
            validator: DartScoreValidator::shared(),
            rules,
            lifecycle: SessionLifecycle::new(),
            slots: [None, None],
            active_turn: 0,
            prompt,
            history: [Vec::new(), Vec::new()],
            selected: NameSet::new(),
            message: "Waiting for players to join.".into(),
            turn_deadline: None,
            created_at: now,
            last_activity: now,
            version: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle.phase()
    }

    pub fn slots(&self) -> &[Option<PlayerSlot>; 2] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&PlayerSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn active_turn(&self) -> usize {
        self.active_turn
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn history(&self, index: usize) -> &[TurnHistoryEntry] {
        self.history.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn selected_names(&self) -> &NameSet {
        &self.selected
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn turn_deadline(&self) -> Option<SystemTime> {
        self.turn_deadline
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn last_activity(&self) -> SystemTime {
        self.last_activity
    }

    /// Counter bumped by every mutation, for cheap change detection while polling.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whole seconds left before the turn deadline, if the timer runs.
    pub fn seconds_remaining(&self, now: SystemTime) -> Option<u64> {
        self.turn_deadline.map(|deadline| {
            deadline
                .duration_since(now)
                .map(|left| left.as_secs())
                .unwrap_or(0)
        })
    }

    /// Whether the session has seen no activity for longer than `ttl`.
    pub fn is_idle(&self, now: SystemTime, ttl: Duration) -> bool {
        now.duration_since(self.last_activity)
            .is_ok_and(|idle| idle > ttl)
    }

    /// Seat a player, starting the game when the second seat fills.
    ///
    /// A signed-in user who is already seated gets their existing seat back.
    pub fn join(
        &mut self,
        user_id: Option<String>,
        display_name: String,
        now: SystemTime,
    ) -> Result<usize, SessionError> {
        if self.phase() == SessionPhase::Closed {
            return Err(SessionError::NotFound(self.id.clone()));
        }

        if let Some(user_id) = user_id.as_deref() {
            if let Some(index) = self.seat_of(user_id) {
                return Ok(index);
            }
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SessionError::Full)?;

        let display_name = display_name.trim().to_owned();
        self.slots[index] = Some(PlayerSlot::new(
            display_name.clone(),
            user_id,
            self.rules.starting_score,
        ));
        self.touch(now);

        if self.slots.iter().all(Option::is_some) {
            self.transition(LifecycleEvent::SeatsFilled);
            self.active_turn = 0;
            self.restart_timer(now);
            let first = self.display_name(0);
            self.message = format!("{first} vs {}. {first} to play.", self.display_name(1));
            info!(session_id = %self.id, "both seats filled; game started");
        } else {
            self.message = format!("{display_name} joined. Waiting for an opponent.");
        }

        Ok(index)
    }

    /// Run a guess through the validation pipeline.
    ///
    /// Only a blank name is rejected without consuming the turn; every other failure forfeits.
    pub fn submit_guess(
        &mut self,
        slot: usize,
        raw_name: &str,
        now: SystemTime,
    ) -> Result<GuessOutcome, SessionError> {
        if !self.lifecycle.is_active() {
            return Err(SessionError::NotStarted);
        }
        if slot != self.active_turn {
            return Err(SessionError::NotYourTurn(slot));
        }

        let name = raw_name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidInput(
                "Please enter a player name".into(),
            ));
        }

        self.touch(now);

        if self.selected.contains(name) {
            return Ok(self.forfeit(ForfeitReason::AlreadyPicked, name, None, now));
        }

        let Some(player) = self.resolve(name).cloned() else {
            let info = self.players.find_by_name(name).map(PlayerRecord::info);
            return Ok(self.forfeit(ForfeitReason::NotValidForPrompt, name, info, now));
        };
        let info = player.info();
        let appearances = player.appearances;

        if appearances > MAX_VISIT_SCORE {
            return Ok(self.forfeit(
                ForfeitReason::TooManyAppearances,
                &player.name,
                Some(info),
                now,
            ));
        }
        if !self.validator.is_valid_three_dart_score(appearances) {
            return Ok(self.forfeit(
                ForfeitReason::InvalidDartScore,
                &player.name,
                Some(info),
                now,
            ));
        }

        // The guess is consumed from here on, even if the score check below forfeits.
        self.selected.insert(&player.name);
        self.history[slot].push(TurnHistoryEntry {
            guessed_name: player.name.clone(),
            result: TurnResult::Appearances(appearances),
        });

        let seat = self.slots[slot].as_mut().ok_or(SessionError::NotStarted)?;
        seat.turns += 1;
        let new_score = seat.score - appearances as i32;
        if new_score < self.rules.bust_floor {
            return Ok(self.forfeit(
                ForfeitReason::BelowFloor {
                    floor: self.rules.bust_floor,
                },
                &player.name,
                Some(info),
                now,
            ));
        }
        seat.score = new_score;

        if new_score <= 0 {
            let winner = seat.display_name.clone();
            let results = self.seat_results(slot);
            self.message = format!("{winner} wins!\n\n{info}");
            info!(session_id = %self.id, slot, final_score = new_score, "game won");

            self.transition(LifecycleEvent::GameWon);
            self.restart_game();
            self.restart_timer(now);

            return Ok(GuessOutcome::Won {
                slot,
                winner,
                appearances,
                final_score: new_score,
                player: info,
                results,
            });
        }

        self.message = format!("{} accepted: -{appearances}\n\n{info}", player.name);
        self.pass_turn(now);

        Ok(GuessOutcome::Accepted {
            appearances,
            score: new_score,
            player: info,
        })
    }

    /// Forfeit the current turn because its deadline passed.
    pub fn forfeit_current_turn(&mut self, now: SystemTime) -> Result<GuessOutcome, SessionError> {
        if !self.lifecycle.is_active() {
            return Err(SessionError::NotStarted);
        }

        self.touch(now);
        Ok(self.forfeit(ForfeitReason::Timeout, TIMEOUT_ENTRY, None, now))
    }

    /// Start over with fresh scores and a new prompt, keeping the seated players.
    pub fn reset(&mut self, now: SystemTime) {
        self.touch(now);
        self.restart_game();
        self.active_turn = 0;
        if self.lifecycle.is_active() {
            self.restart_timer(now);
        }
        self.message = "Game has been reset!".into();
    }

    /// Remove a signed-in player from the session.
    ///
    /// Leaving an active game counts as a forfeited loss for the leaver.
    pub fn leave(&mut self, user_id: &str, now: SystemTime) -> Result<LeaveOutcome, SessionError> {
        let index = self
            .seat_of(user_id)
            .ok_or_else(|| SessionError::NotAPlayer(user_id.to_owned()))?;

        let forfeit = self.lifecycle.is_active().then(|| {
            let mut seat = self.seat_result(index, false);
            seat.result.forfeited = true;
            seat
        });
        self.touch(now);

        if index == 0 {
            self.transition(LifecycleEvent::HostLeft);
            self.turn_deadline = None;
            self.message = "Host left; session closed.".into();
            info!(session_id = %self.id, "host left; closing session");
            return Ok(LeaveOutcome::Closed { forfeit });
        }

        let name = self.display_name(index);
        if self.lifecycle.is_active() {
            self.transition(LifecycleEvent::GuestLeft);
        }
        self.slots[index] = None;
        self.turn_deadline = None;
        self.active_turn = 0;
        self.restart_game();
        self.message = format!("{name} left. Waiting for an opponent.");
        info!(session_id = %self.id, "guest left; back to lobby");

        Ok(LeaveOutcome::ReturnedToLobby { forfeit })
    }

    /// Player names containing `query` that have not been picked yet.
    pub fn search_candidates(&self, query: &str, limit: usize) -> Vec<String> {
        self.players.search(query, &self.selected, limit)
    }

    fn seat_of(&self, user_id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .and_then(|slot| slot.user_id.as_deref())
                .is_some_and(|id| id == user_id)
        })
    }

    fn display_name(&self, index: usize) -> String {
        self.slot(index)
            .map(|slot| slot.display_name.clone())
            .unwrap_or_default()
    }

    /// First player with this name that satisfies the current prompt.
    fn resolve(&self, name: &str) -> Option<&PlayerRecord> {
        let prompt = self.prompt.as_ref()?;
        self.players
            .find_all_by_name(name)
            .find(|player| prompt.admits(player))
    }

    fn forfeit(
        &mut self,
        reason: ForfeitReason,
        recorded_name: &str,
        player: Option<PlayerInfo>,
        now: SystemTime,
    ) -> GuessOutcome {
        self.history[self.active_turn].push(TurnHistoryEntry {
            guessed_name: recorded_name.to_owned(),
            result: TurnResult::Forfeit,
        });

        self.message = match &player {
            Some(info) => format!("{}\n\n{info}", reason.message()),
            None => reason.message().into_owned(),
        };
        debug!(session_id = %self.id, slot = self.active_turn, ?reason, "turn forfeited");

        self.pass_turn(now);
        GuessOutcome::Forfeited { reason, player }
    }

    fn pass_turn(&mut self, now: SystemTime) {
        self.active_turn = 1 - self.active_turn;
        self.restart_timer(now);
    }

    fn restart_timer(&mut self, now: SystemTime) {
        self.turn_deadline = now
            .checked_add(self.rules.turn_duration)
            .or_else(|| now.checked_add(DEFAULT_TURN_DURATION));
    }

    /// Reset scores, history and picks, then draw a new prompt.
    fn restart_game(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.score = self.rules.starting_score;
            slot.turns = 0;
        }
        for entries in &mut self.history {
            entries.clear();
        }
        self.selected.clear();
        self.prompt = self.prompts.next_prompt(self.players.vocabulary());
    }

    fn seat_results(&self, winner: usize) -> Vec<SeatResult> {
        (0..self.slots.len())
            .filter(|&index| self.slots[index].is_some())
            .map(|index| self.seat_result(index, index == winner))
            .collect()
    }

    fn seat_result(&self, index: usize, won: bool) -> SeatResult {
        let seat = self.slot(index).cloned().unwrap_or_else(|| {
            PlayerSlot::new(String::new(), None, self.rules.starting_score)
        });
        SeatResult {
            user_id: seat.user_id,
            display_name: seat.display_name,
            result: GameResult {
                won,
                final_score: seat.score,
                opponent_name: self.display_name(1 - index),
                turns_played: seat.turns,
                forfeited: false,
            },
        }
    }

    fn transition(&mut self, event: LifecycleEvent) {
        // Callers only emit events valid for the phase they checked.
        if let Err(err) = self.lifecycle.apply(event) {
            debug!(session_id = %self.id, error = %err, "ignored lifecycle event");
        }
    }

    fn touch(&mut self, now: SystemTime) {
        self.last_activity = now;
        self.version += 1;
    }
}
