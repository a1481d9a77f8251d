use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::{decode_image, Classification};
use crate::errors::AppError;
use crate::layout::{layout_report, AfmMetrics, ReportInput};
use crate::render::render_pdf;
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::storage::report_key;

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_key: String,
    pub generated_at: DateTime<Utc>,
    pub classification: Classification,
    pub narrative: String,
    pub download_url: &'static str,
}

/// POST /api/v1/reports
/// Builds the PDF for the session's current classification: narrative, layout, render,
/// persist. Nothing is stored unless every step succeeds.
pub async fn handle_create_report(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
) -> Result<(StatusCode, Json<ReportResponse>), AppError> {
    let upload = session.require_upload()?.clone();

    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.user_id)))?;
    let profile = user.profile().ok_or_else(|| {
        AppError::UnprocessableEntity("Submit the intake form before generating a report".into())
    })?;

    let image_bytes = state.artifacts.get(&upload.key).await?;
    let image = decode_image(&image_bytes)?;

    let narrative = state
        .narrator
        .explain(&profile, &upload.classification)
        .await?;

    let generated_at = Utc::now();
    let input = ReportInput {
        profile: &profile,
        classification: &upload.classification,
        image_size: (image.width(), image.height()),
        narrative: &narrative,
        generated_at,
    };
    let document = layout_report(&input, &state.layout, &AfmMetrics)?;
    debug!(
        lines = document.text_lines().len(),
        cursor_end = document.cursor_end,
        image = ?document.image_placement(),
        "Report laid out"
    );
    let pdf = render_pdf(&document, &image)?;

    let key = report_key(session.user_id, generated_at);
    state.artifacts.put(&key, pdf, "application/pdf").await?;
    state.users.set_report_path(session.user_id, &key).await?;

    session.record_report(key.clone())?;
    state.sessions.save(&session).await?;

    info!(user_id = %session.user_id, "Report generated at {key}");

    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            report_key: key,
            generated_at,
            classification: upload.classification,
            narrative,
            download_url: "/api/v1/reports/latest",
        }),
    ))
}

/// GET /api/v1/reports/latest
/// Streams the user's most recent report, which may come from an earlier session.
pub async fn handle_latest_report(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    let key = state
        .users
        .find_by_id(session.user_id)
        .await?
        .and_then(|user| user.pdf_path)
        .ok_or_else(|| AppError::NotFound("No report has been generated yet".to_string()))?;

    let pdf = state.artifacts.get(&key).await?;
    let filename = key.rsplit('/').next().unwrap_or("report.pdf");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    ))
}
