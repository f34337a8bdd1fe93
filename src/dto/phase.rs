use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::SessionPhase;

/// Session phase exposed to polling clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// Waiting for a second player.
    Lobby,
    /// Both seats filled; guesses accepted.
    Active,
    /// Host left; the session is gone.
    Closed,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Lobby => VisibleSessionPhase::Lobby,
            SessionPhase::Active => VisibleSessionPhase::Active,
            SessionPhase::Closed => VisibleSessionPhase::Closed,
        }
    }
}
