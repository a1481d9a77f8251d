use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::classifier::{classify, decode_image, Classification};
use crate::errors::AppError;
use crate::session::{CurrentSession, UploadedArtifact};
use crate::state::AppState;
use crate::storage::upload_key;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub upload_key: String,
    pub width: u32,
    pub height: u32,
    pub classification: Classification,
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read image field: {e}")))?;
            if data.is_empty() {
                return Err(AppError::Validation("Image field is empty".to_string()));
            }
            return Ok(data);
        }
    }
    Err(AppError::Validation(
        "Multipart field 'image' is required".to_string(),
    ))
}

/// POST /api/v1/classify
/// Multipart upload with an `image` field. Stores the image and records the prediction
/// as the session's current classification.
pub async fn handle_classify(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    mut multipart: Multipart,
) -> Result<Json<ClassifyResponse>, AppError> {
    session.check_upload()?;

    let data = read_image_field(&mut multipart).await?;
    let format = image::guess_format(&data)
        .map_err(|_| AppError::UnprocessableEntity("Unrecognised image format".to_string()))?;
    let image = decode_image(&data)?;

    let classification = classify(state.classifier.as_ref(), &image).await?;

    let uploaded_at = Utc::now();
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let key = upload_key(session.user_id, uploaded_at, extension);
    state
        .artifacts
        .put(&key, data.to_vec(), format.to_mime_type())
        .await?;

    let upload = UploadedArtifact {
        key: key.clone(),
        width: image.width(),
        height: image.height(),
        classification: classification.clone(),
        uploaded_at,
    };
    session.record_upload(upload)?;
    state.sessions.save(&session).await?;

    info!(
        user_id = %session.user_id,
        code = %classification.code,
        "Stored upload {key}"
    );

    Ok(Json(ClassifyResponse {
        upload_key: key,
        width: image.width(),
        height: image.height(),
        classification,
    }))
}
