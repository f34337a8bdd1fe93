use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::{
    dto::game::{
        GuessRequest, JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, SearchResponse,
        SessionSnapshot, TurnOutcome, TurnResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        game::{GuessOutcome, LeaveOutcome, SeatResult},
        registry::SessionHandle,
    },
};

/// Open a new lobby session.
pub async fn create_session(state: &SharedState) -> SessionSnapshot {
    let now = SystemTime::now();
    sweep(state, now);

    let (_, handle) = state.create_session(now);
    let session = handle.lock().await;
    SessionSnapshot::capture(&session, now)
}

/// Current state of a session, for polling clients.
pub async fn get_session(state: &SharedState, id: &str) -> Result<SessionSnapshot, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;
    let session = handle.lock().await;
    Ok(SessionSnapshot::capture(&session, now))
}

/// Seat a player; the game starts once both seats are filled.
pub async fn join_session(
    state: &SharedState,
    id: &str,
    request: JoinRequest,
) -> Result<JoinResponse, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;
    let mut session = handle.lock().await;

    let slot = session.join(request.user_id, request.display_name, now)?;
    info!(session_id = id, slot, "player joined");

    Ok(JoinResponse {
        slot,
        session: SessionSnapshot::capture(&session, now),
    })
}

/// Submit a guess for the active slot and record stats when it wins the game.
pub async fn submit_guess(
    state: &SharedState,
    id: &str,
    request: GuessRequest,
) -> Result<TurnResponse, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;

    let (outcome, snapshot) = {
        let mut session = handle.lock().await;
        let outcome = session.submit_guess(request.slot, &request.name, now)?;
        (outcome, SessionSnapshot::capture(&session, now))
    };

    if let GuessOutcome::Won { results, .. } = &outcome {
        record_results(state, results, now).await;
    }

    Ok(TurnResponse {
        outcome: TurnOutcome::from(&outcome),
        session: snapshot,
    })
}

/// Record a timeout for the active turn. The deadline is not checked here.
pub async fn forfeit_turn(state: &SharedState, id: &str) -> Result<TurnResponse, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;
    let mut session = handle.lock().await;

    let outcome = session.forfeit_current_turn(now)?;
    debug!(session_id = id, "turn timed out");

    Ok(TurnResponse {
        outcome: TurnOutcome::from(&outcome),
        session: SessionSnapshot::capture(&session, now),
    })
}

/// Restart the game with fresh scores and prompt.
pub async fn reset_session(state: &SharedState, id: &str) -> Result<SessionSnapshot, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;
    let mut session = handle.lock().await;

    session.reset(now);
    info!(session_id = id, "session reset");

    Ok(SessionSnapshot::capture(&session, now))
}

/// Remove a player. The host leaving closes the session for good.
pub async fn leave_session(
    state: &SharedState,
    id: &str,
    request: LeaveRequest,
) -> Result<LeaveResponse, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;

    let (outcome, snapshot) = {
        let mut session = handle.lock().await;
        let outcome = session.leave(&request.user_id, now)?;
        let snapshot = match outcome {
            LeaveOutcome::Closed { .. } => None,
            LeaveOutcome::ReturnedToLobby { .. } => Some(SessionSnapshot::capture(&session, now)),
        };
        (outcome, snapshot)
    };

    if let LeaveOutcome::Closed { .. } = outcome {
        state.sessions().remove(id);
    }
    if let Some(forfeit) = outcome.forfeit() {
        record_results(state, std::slice::from_ref(forfeit), now).await;
    }

    Ok(LeaveResponse {
        closed: snapshot.is_none(),
        session: snapshot,
    })
}

/// Unpicked player names containing `query`.
pub async fn search_candidates(
    state: &SharedState,
    id: &str,
    query: &str,
) -> Result<SearchResponse, ServiceError> {
    let now = SystemTime::now();
    let handle = lookup(state, id, now)?;
    let session = handle.lock().await;

    Ok(SearchResponse {
        names: session.search_candidates(query, state.config().search_limit),
    })
}

/// Evict idle sessions, then resolve `id`.
fn lookup(state: &SharedState, id: &str, now: SystemTime) -> Result<SessionHandle, ServiceError> {
    sweep(state, now);
    Ok(state.sessions().get(id)?)
}

fn sweep(state: &SharedState, now: SystemTime) {
    let evicted = state.sessions().evict_idle(now);
    if evicted > 0 {
        debug!(evicted, "swept idle sessions");
    }
}

/// Feed finished games of signed-in players to the stats tracker.
///
/// Storage failures are logged; the game itself already moved on.
async fn record_results(state: &SharedState, results: &[SeatResult], now: SystemTime) {
    for seat in results {
        let Some(user_id) = seat.user_id.as_deref() else {
            continue;
        };

        if let Err(err) = state
            .stats()
            .record_result(user_id, &seat.display_name, &seat.result, now)
            .await
        {
            warn!(user_id, error = %err, "failed to record game result");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::profile_store::MemoryProfileStore,
        dto::phase::VisibleSessionPhase,
        state::{
            AppState,
            players::tests::sample_database,
            prompt::tests::{ScriptedPrompts, arsenal_forward},
        },
    };

    fn app_state(config: AppConfig) -> SharedState {
        AppState::with_prompts(
            config,
            sample_database(),
            Arc::new(MemoryProfileStore::new()),
            Box::new(|| Box::new(ScriptedPrompts::new([arsenal_forward()]))),
        )
    }

    fn join(user_id: &str, display_name: &str) -> JoinRequest {
        JoinRequest {
            user_id: Some(user_id.into()),
            display_name: display_name.into(),
        }
    }

    fn guess(slot: usize, name: &str) -> GuessRequest {
        GuessRequest {
            slot,
            name: name.into(),
        }
    }

    async fn started_session(state: &SharedState) -> String {
        let id = create_session(state).await.id;
        join_session(state, &id, join("u1", "Ada")).await.unwrap();
        join_session(state, &id, join("u2", "Bob")).await.unwrap();
        id
    }

    #[tokio::test]
    async fn two_joins_start_the_game() {
        let state = app_state(AppConfig::default());
        let created = create_session(&state).await;
        assert_eq!(created.phase, VisibleSessionPhase::Lobby);

        let first = join_session(&state, &created.id, join("u1", "Ada")).await.unwrap();
        assert_eq!(first.slot, 0);
        let second = join_session(&state, &created.id, join("u2", "Bob")).await.unwrap();
        assert_eq!(second.slot, 1);
        assert_eq!(second.session.phase, VisibleSessionPhase::Active);
        assert!(second.session.turn_deadline.is_some());

        let third = join_session(&state, &created.id, join("u3", "Cy")).await;
        assert!(matches!(third, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn unknown_sessions_are_not_found() {
        let state = app_state(AppConfig::default());
        let err = get_session(&state, "NOPE00").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn accepted_guess_updates_the_snapshot() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let response = submit_guess(&state, &id, guess(0, "Eddie Nketiah")).await.unwrap();
        assert!(matches!(response.outcome, TurnOutcome::Accepted { score: 463, .. }));
        assert_eq!(response.session.active_turn, 1);

        let polled = get_session(&state, &id).await.unwrap();
        assert_eq!(polled.version, response.session.version);
        assert_eq!(polled.selected_players, vec!["Eddie Nketiah"]);
    }

    #[tokio::test]
    async fn blank_guess_is_a_bad_request() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let err = submit_guess(&state, &id, guess(0, "  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(message) if message == "Please enter a player name"));
    }

    #[tokio::test]
    async fn winning_records_stats_for_both_players() {
        let mut config = AppConfig::default();
        config.rules.starting_score = 38;
        let state = app_state(config);
        let id = started_session(&state).await;

        let response = submit_guess(&state, &id, guess(0, "Eddie Nketiah")).await.unwrap();
        assert!(matches!(response.outcome, TurnOutcome::Won { slot: 0, final_score: 0, .. }));
        assert_eq!(response.session.active_turn, 0);
        assert!(response.session.selected_players.is_empty());

        let winner = state.stats().profile("u1").await.unwrap().unwrap();
        assert_eq!(winner.stats.games_won, 1);
        assert_eq!(winner.stats.perfect_games, 1);
        let loser = state.stats().profile("u2").await.unwrap().unwrap();
        assert_eq!(loser.stats.games_lost, 1);
        assert_eq!(loser.recent_games[0].result.opponent_name, "Ada");
    }

    #[tokio::test]
    async fn host_leaving_removes_the_session() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let response = leave_session(&state, &id, LeaveRequest { user_id: "u1".into() })
            .await
            .unwrap();
        assert!(response.closed);
        assert!(response.session.is_none());
        assert!(get_session(&state, &id).await.is_err());

        let leaver = state.stats().profile("u1").await.unwrap().unwrap();
        assert_eq!(leaver.stats.forfeits, 1);
        assert!(state.stats().profile("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guest_leaving_keeps_the_session_in_the_lobby() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let response = leave_session(&state, &id, LeaveRequest { user_id: "u2".into() })
            .await
            .unwrap();
        assert!(!response.closed);
        assert_eq!(response.session.unwrap().phase, VisibleSessionPhase::Lobby);

        let err = leave_session(&state, &id, LeaveRequest { user_id: "u2".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn forfeit_and_reset_round_trip() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let response = forfeit_turn(&state, &id).await.unwrap();
        assert_eq!(response.session.active_turn, 1);

        let reset = reset_session(&state, &id).await.unwrap();
        assert_eq!(reset.active_turn, 0);
        assert!(reset.history.iter().all(Vec::is_empty));
        assert_eq!(reset.message, "Game has been reset!");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_timeouts_never_interleave() {
        let state = app_state(AppConfig::default());
        let id = started_session(&state).await;

        let tasks = (0..40)
            .map(|_| {
                let state = state.clone();
                let id = id.clone();
                tokio::spawn(async move { forfeit_turn(&state, &id).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = get_session(&state, &id).await.unwrap();
        assert_eq!(snapshot.history[0].len(), 20);
        assert_eq!(snapshot.history[1].len(), 20);
        assert_eq!(snapshot.active_turn, 0);
        assert_eq!(snapshot.message, "Time's up! Turn forfeited.");
    }

    #[tokio::test]
    async fn search_is_capped_by_config() {
        let mut config = AppConfig::default();
        config.search_limit = 2;
        let state = app_state(config);
        let id = started_session(&state).await;

        let response = search_candidates(&state, &id, "e").await.unwrap();
        assert_eq!(response.names.len(), 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_swept_on_access() {
        let mut config = AppConfig::default();
        config.session_idle = std::time::Duration::ZERO;
        let state = app_state(config);
        let id = create_session(&state).await.id;

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(matches!(
            get_session(&state, &id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.sessions().is_empty());
    }
}
