use thiserror::Error;

/// Lifecycle phases of a single game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, fewer than two players seated, no turn timer.
    Lobby,
    /// Both seats taken; guesses are accepted and the turn timer runs.
    Active,
    /// The host left; the session is about to be dropped from the registry.
    Closed,
}

/// Events that can be applied to the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The second seat was filled.
    SeatsFilled,
    /// A player checked out; the game restarts with fresh scores.
    GameWon,
    /// The guest (second seat) left.
    GuestLeft,
    /// The host (first seat) left.
    HostLeft,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: LifecycleEvent,
}

/// Lifecycle of a session, counting applied transitions.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    phase: SessionPhase,
    transitions: usize,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Lobby,
            transitions: 0,
        }
    }
}

impl SessionLifecycle {
    /// Create a new lifecycle starting in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Apply `event`, returning the phase after the transition.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.transitions += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: LifecycleEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Lobby, LifecycleEvent::SeatsFilled) => SessionPhase::Active,
            (SessionPhase::Active, LifecycleEvent::GameWon) => SessionPhase::Active,
            (SessionPhase::Active, LifecycleEvent::GuestLeft) => SessionPhase::Lobby,
            (SessionPhase::Lobby | SessionPhase::Active, LifecycleEvent::HostLeft) => {
                SessionPhase::Closed
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
