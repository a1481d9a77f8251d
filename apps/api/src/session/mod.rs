//! Login sessions and the per-session intake flow.

pub mod flow;
pub mod store;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub use flow::{FlowError, FlowState, SessionContext, UploadedArtifact};
pub use store::{MemorySessionStore, RedisSessionStore, SessionStore};

/// Parses `Authorization: Bearer <uuid>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

/// The caller's live session. Rejects with 401 when the token is missing or expired.
pub struct CurrentSession(pub SessionContext);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = state
            .sessions
            .load(token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentSession(session))
    }
}
