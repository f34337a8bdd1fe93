use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness, flagging missing player data or failing profile storage as degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let players = state.players().len();
    let sessions = state.sessions().len();

    let storage_ok = match state.stats().store().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "profile storage health check failed");
            false
        }
    };

    if players == 0 {
        warn!("player database is empty");
    }

    if storage_ok && players > 0 {
        HealthResponse::ok(players, sessions)
    } else {
        HealthResponse::degraded(players, sessions)
    }
}
