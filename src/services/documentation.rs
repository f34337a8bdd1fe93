use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the football darts backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_session,
        crate::routes::game::get_session,
        crate::routes::game::join_session,
        crate::routes::game::submit_guess,
        crate::routes::game::forfeit_turn,
        crate::routes::game::reset_session,
        crate::routes::game::leave_session,
        crate::routes::game::search_candidates,
        crate::routes::profiles::get_profile,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleSessionPhase,
            crate::dto::game::JoinRequest,
            crate::dto::game::JoinResponse,
            crate::dto::game::GuessRequest,
            crate::dto::game::LeaveRequest,
            crate::dto::game::LeaveResponse,
            crate::dto::game::SearchResponse,
            crate::dto::game::SessionSnapshot,
            crate::dto::game::SlotSummary,
            crate::dto::game::HistoryEntry,
            crate::dto::game::HistoryResult,
            crate::dto::game::TurnOutcome,
            crate::dto::game::TurnResponse,
            crate::dto::profile::ProfileResponse,
            crate::dto::profile::StatsSummary,
            crate::dto::profile::RecentGameSummary,
            crate::state::game::ForfeitReason,
            crate::state::players::PlayerInfo,
            crate::state::players::Position,
            crate::state::prompt::Prompt,
            crate::state::stats::Achievement,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Session lifecycle"),
        (name = "turns", description = "Guesses, timeouts and candidate search"),
        (name = "profiles", description = "Per-user stats and achievements"),
    )
)]
pub struct ApiDoc;
