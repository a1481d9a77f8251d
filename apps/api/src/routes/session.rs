use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::session::{CurrentSession, FlowState, SessionContext};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub disclaimer_accepted: bool,
    pub form_submitted: bool,
    pub report_generated: bool,
    pub flow: FlowState,
}

impl From<&SessionContext> for SessionResponse {
    fn from(session: &SessionContext) -> Self {
        Self {
            username: session.username.clone(),
            disclaimer_accepted: session.disclaimer_accepted(),
            form_submitted: session.form_submitted(),
            report_generated: session.report_generated().is_some(),
            flow: session.state.clone(),
        }
    }
}

/// GET /api/v1/session
pub async fn handle_get_session(
    CurrentSession(session): CurrentSession,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/v1/session/disclaimer
/// Users who already have a profile on file go straight to the upload step.
pub async fn handle_accept_disclaimer(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
) -> Result<Json<SessionResponse>, AppError> {
    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.user_id)))?;

    session.accept_disclaimer(user.profile().is_some())?;
    state.sessions.save(&session).await?;

    Ok(Json(SessionResponse::from(&session)))
}
