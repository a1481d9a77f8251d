use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::session::{CurrentSession, FlowState, SessionContext};
use crate::state::AppState;
use crate::users::{hash_password, validate_registration, verify_password};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub flow: FlowState,
}

impl From<&SessionContext> for AuthResponse {
    fn from(session: &SessionContext) -> Self {
        Self {
            token: session.token.to_string(),
            username: session.username.clone(),
            flow: session.state.clone(),
        }
    }
}

/// POST /api/v1/auth/register
/// Creates the account and logs it in.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let username = req.username.trim();
    validate_registration(username, &req.password, &req.confirm_password)?;

    let user = state
        .users
        .create_user(username, &hash_password(&req.password))
        .await?;

    let session = SessionContext::new(user.id, user.username);
    state.sessions.save(&session).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(&session))))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = req.username.trim();
    let user = state.users.find_by_username(username).await?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        warn!("Failed login for {username}");
        return Err(AppError::Unauthorized);
    };

    let session = SessionContext::new(user.id, user.username);
    state.sessions.save(&session).await?;
    info!(user_id = %session.user_id, "User logged in");

    Ok(Json(AuthResponse::from(&session)))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session.token).await?;
    info!(user_id = %session.user_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
