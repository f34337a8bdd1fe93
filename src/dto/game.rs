use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        phase::VisibleSessionPhase,
        validation::{validate_display_name, validate_user_id},
    },
    state::{
        game::{ForfeitReason, GameSession, GuessOutcome, PlayerSlot, TurnHistoryEntry, TurnResult},
        players::PlayerInfo,
        prompt::Prompt,
    },
};

/// Marker shown in place of an appearance count for forfeited turns.
pub const FORFEIT_MARKER: &str = "X";

/// Payload used to take a seat in a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    /// Signed-in users can rejoin and have their results tracked.
    #[serde(default)]
    #[validate(custom(function = "validate_user_id"))]
    pub user_id: Option<String>,
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
}

/// Payload carrying a guess for the active slot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GuessRequest {
    /// Seat the guess is made from (0 or 1).
    #[validate(range(max = 1))]
    pub slot: usize,
    /// Guessed player name; blank names are rejected without consuming the turn.
    #[validate(length(max = 128))]
    pub name: String,
}

/// Payload identifying the user leaving a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LeaveRequest {
    #[validate(custom(function = "validate_user_id"))]
    pub user_id: String,
}

/// Query string of the candidate search.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SearchQuery {
    #[serde(default)]
    #[validate(length(max = 128))]
    pub q: String,
}

/// Unpicked player names containing the query.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub names: Vec<String>,
}

/// Seat assigned by a join, with the resulting session state.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub slot: usize,
    pub session: SessionSnapshot,
}

/// Transition produced by a guess or forfeit, with the resulting session state.
#[derive(Debug, Serialize, ToSchema)]
pub struct TurnResponse {
    pub outcome: TurnOutcome,
    pub session: SessionSnapshot,
}

/// Result of leaving a session. `session` is absent once the session closed.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    pub closed: bool,
    pub session: Option<SessionSnapshot>,
}

/// Public view of one turn transition.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    Forfeited {
        reason: ForfeitReason,
        message: String,
        player: Option<PlayerInfo>,
    },
    Accepted {
        appearances: u32,
        score: i32,
        player: PlayerInfo,
    },
    Won {
        slot: usize,
        winner: String,
        appearances: u32,
        final_score: i32,
        player: PlayerInfo,
    },
}

impl From<&GuessOutcome> for TurnOutcome {
    fn from(value: &GuessOutcome) -> Self {
        match value {
            GuessOutcome::Forfeited { reason, player } => TurnOutcome::Forfeited {
                reason: *reason,
                message: reason.message().into_owned(),
                player: player.clone(),
            },
            GuessOutcome::Accepted {
                appearances,
                score,
                player,
            } => TurnOutcome::Accepted {
                appearances: *appearances,
                score: *score,
                player: player.clone(),
            },
            GuessOutcome::Won {
                slot,
                winner,
                appearances,
                final_score,
                player,
                ..
            } => TurnOutcome::Won {
                slot: *slot,
                winner: winner.clone(),
                appearances: *appearances,
                final_score: *final_score,
                player: player.clone(),
            },
        }
    }
}

/// Public projection of a seated player.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SlotSummary {
    pub display_name: String,
    pub user_id: Option<String>,
    pub score: i32,
    pub turns: u32,
}

impl From<&PlayerSlot> for SlotSummary {
    fn from(slot: &PlayerSlot) -> Self {
        Self {
            display_name: slot.display_name.clone(),
            user_id: slot.user_id.clone(),
            score: slot.score,
            turns: slot.turns,
        }
    }
}

/// Appearance count thrown, or the forfeit marker.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum HistoryResult {
    Appearances(u32),
    Forfeit(String),
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub name: String,
    pub result: HistoryResult,
}

impl From<&TurnHistoryEntry> for HistoryEntry {
    fn from(entry: &TurnHistoryEntry) -> Self {
        let result = match entry.result {
            TurnResult::Appearances(apps) => HistoryResult::Appearances(apps),
            TurnResult::Forfeit => HistoryResult::Forfeit(FORFEIT_MARKER.into()),
        };
        Self {
            name: entry.guessed_name.clone(),
            result,
        }
    }
}

/// Full session state returned to polling clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub id: String,
    pub phase: VisibleSessionPhase,
    /// Both seats, `null` when empty.
    pub slots: Vec<Option<SlotSummary>>,
    pub active_turn: usize,
    pub prompt: Option<Prompt>,
    /// Prompt rendered for display.
    pub prompt_text: Option<String>,
    /// Turn history per seat, oldest first.
    pub history: Vec<Vec<HistoryEntry>>,
    pub selected_players: Vec<String>,
    pub message: String,
    pub turn_deadline: Option<String>,
    pub seconds_remaining: Option<u64>,
    pub created_at: String,
    pub last_activity: String,
    /// Increases with every change; clients can skip re-rendering when it is unchanged.
    pub version: u64,
}

impl SessionSnapshot {
    pub fn capture(session: &GameSession, now: SystemTime) -> Self {
        Self {
            id: session.id().to_owned(),
            phase: session.phase().into(),
            slots: session
                .slots()
                .iter()
                .map(|slot| slot.as_ref().map(SlotSummary::from))
                .collect(),
            active_turn: session.active_turn(),
            prompt: session.prompt().cloned(),
            prompt_text: session.prompt().map(ToString::to_string),
            history: (0..session.slots().len())
                .map(|slot| session.history(slot).iter().map(HistoryEntry::from).collect())
                .collect(),
            selected_players: session
                .selected_names()
                .iter()
                .map(str::to_owned)
                .collect(),
            message: session.message().to_owned(),
            turn_deadline: session.turn_deadline().map(format_system_time),
            seconds_remaining: session.seconds_remaining(now),
            created_at: format_system_time(session.created_at()),
            last_activity: format_system_time(session.last_activity()),
            version: session.version(),
        }
    }
}
