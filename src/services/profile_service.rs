use crate::{dto::profile::ProfileResponse, error::ServiceError, state::SharedState};

/// Historical stats of a user who has finished at least one game.
pub async fn get_profile(state: &SharedState, user_id: &str) -> Result<ProfileResponse, ServiceError> {
    let Some(profile) = state.stats().profile(user_id).await? else {
        return Err(ServiceError::NotFound(format!("profile `{user_id}`")));
    };
    Ok(ProfileResponse::from(&profile))
}
