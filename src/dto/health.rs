use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Player records loaded at startup.
    pub players: usize,
    /// Live sessions in the registry.
    pub sessions: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(players: usize, sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            players,
            sessions,
        }
    }

    /// Degraded: no player data, or profile storage failing.
    pub fn degraded(players: usize, sessions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            players,
            sessions,
        }
    }
}
