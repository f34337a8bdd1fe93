use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{profile::ProfileResponse, validation::validate_user_id},
    error::AppError,
    services::profile_service,
    state::SharedState,
};

/// Read-only access to user stats.
pub fn router() -> Router<SharedState> {
    Router::new().route("/profiles/{user_id}", get(get_profile))
}

/// Historical stats and achievements of a user.
#[utoipa::path(
    get,
    path = "/profiles/{user_id}",
    tag = "profiles",
    params(("user_id" = String, Path, description = "External user identifier")),
    responses(
        (status = 200, description = "Profile found", body = ProfileResponse),
        (status = 404, description = "User has no recorded games")
    )
)]
pub async fn get_profile(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_user_id(&user_id).map_err(|err| AppError::BadRequest(err.to_string()))?;
    Ok(Json(profile_service::get_profile(&state, &user_id).await?))
}
