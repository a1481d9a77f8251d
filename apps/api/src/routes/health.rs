use axum::Json;
use serde_json::{json, Value};

use crate::content::{educational_content, EducationalContent};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "dermalens-api"
    }))
}

/// GET /api/v1/content
/// Public educational material; no session required.
pub async fn content_handler() -> Json<EducationalContent> {
    Json(educational_content())
}
