use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::game::{
        GuessRequest, JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, SearchQuery,
        SearchResponse, SessionSnapshot, TurnResponse,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes driving game sessions: lifecycle, turns and candidate search.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/guess", post(submit_guess))
        .route("/sessions/{id}/forfeit", post(forfeit_turn))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/leave", post(leave_session))
        .route("/sessions/{id}/search", get(search_candidates))
}

/// Open a new session waiting for two players.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Session created", body = SessionSnapshot)
    )
)]
pub async fn create_session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(game_service::create_session(&state).await)
}

/// Poll the full state of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session state", body = SessionSnapshot),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(game_service::get_session(&state, &id).await?))
}

/// Take a seat. Signed-in users get their previous seat back when rejoining.
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Seat assigned", body = JoinResponse),
        (status = 409, description = "Session is full")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::join_session(&state, &id, payload).await?))
}

/// Guess a player for the active slot.
#[utoipa::path(
    post,
    path = "/sessions/{id}/guess",
    tag = "turns",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Guess accepted, forfeited or winning", body = TurnResponse),
        (status = 400, description = "Blank name"),
        (status = 409, description = "Game not started or not this slot's turn")
    )
)]
pub async fn submit_guess(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<GuessRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::submit_guess(&state, &id, payload).await?))
}

/// Forfeit the active turn as a timeout.
///
/// The deadline in the snapshot is advisory: the server never forfeits on its own and
/// does not check the deadline here, so clients call this once their countdown hits zero.
#[utoipa::path(
    post,
    path = "/sessions/{id}/forfeit",
    tag = "turns",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Active turn recorded as a timeout, whether or not the deadline passed", body = TurnResponse),
        (status = 409, description = "Game not started")
    )
)]
pub async fn forfeit_turn(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>, AppError> {
    Ok(Json(game_service::forfeit_turn(&state, &id).await?))
}

/// Restart the game with fresh scores.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Session reset", body = SessionSnapshot))
)]
pub async fn reset_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(game_service::reset_session(&state, &id).await?))
}

/// Leave a session; the host leaving closes it.
#[utoipa::path(
    post,
    path = "/sessions/{id}/leave",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = LeaveRequest,
    responses(
        (status = 200, description = "Player left", body = LeaveResponse),
        (status = 403, description = "User is not seated in the session")
    )
)]
pub async fn leave_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::leave_session(&state, &id, payload).await?))
}

/// Autocomplete player names that have not been picked yet.
#[utoipa::path(
    get,
    path = "/sessions/{id}/search",
    tag = "turns",
    params(
        ("id" = String, Path, description = "Session identifier"),
        ("q" = String, Query, description = "Case-insensitive substring of the player name")
    ),
    responses((status = 200, description = "Matching names", body = SearchResponse))
)]
pub async fn search_candidates(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    query.validate()?;
    Ok(Json(
        game_service::search_candidates(&state, &id, &query.q).await?,
    ))
}
