use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::routes::session::SessionResponse;
use crate::session::CurrentSession;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .users
        .find_by_id(session.user_id)
        .await?
        .and_then(|user| user.profile())
        .ok_or_else(|| AppError::NotFound("No profile has been submitted".to_string()))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
/// Submits (or resubmits) the medical-intake form.
pub async fn handle_put_profile(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    Json(profile): Json<UserProfile>,
) -> Result<Json<SessionResponse>, AppError> {
    profile.validate().map_err(AppError::Validation)?;
    session.submit_profile()?;

    state.users.update_profile(session.user_id, &profile).await?;
    state.sessions.save(&session).await?;

    Ok(Json(SessionResponse::from(&session)))
}
