//! Classification adapter, the only module that talks to the lesion model.
//!
//! The trained network is opaque: a normalized 224×224 RGB tensor goes in, a
//! probability vector over `LABELS` comes out. The model is served over HTTP
//! (TensorFlow-Serving REST shape); `Classifier` is the seam so handlers can be
//! tested without a model server.
//!
//! No retry or fallback: a failed prediction fails the request.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod labels;

pub use labels::LABELS;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 224;
const CHANNELS: usize = 3;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}

/// Row-major HWC tensor with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Nested `[height][width][channel]` view expected by the model server.
    pub fn to_nested(&self) -> Vec<Vec<[f32; CHANNELS]>> {
        self.data
            .chunks_exact(self.width * CHANNELS)
            .map(|row| {
                row.chunks_exact(CHANNELS)
                    .map(|px| [px[0], px[1], px[2]])
                    .collect()
            })
            .collect()
    }
}

/// The arg-max prediction for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class_index: usize,
    /// Short dataset code, e.g. `mel`.
    pub code: String,
    /// Human-readable name, e.g. `Melanoma`.
    pub label: String,
    pub confidence: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Preprocessing
// ────────────────────────────────────────────────────────────────────────────

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    image::load_from_memory(bytes).map_err(|e| ClassifierError::Decode(e.to_string()))
}

/// Resizes to the model resolution and scales channels to `[0, 1]`.
pub fn to_tensor(image: &DynamicImage) -> ImageTensor {
    let resized = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();
    let data = resized
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / 255.0)
        .collect();
    ImageTensor {
        width: INPUT_SIZE as usize,
        height: INPUT_SIZE as usize,
        data,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model boundary
// ────────────────────────────────────────────────────────────────────────────

/// Opaque model: tensor in, one probability per entry of `LABELS` out.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn predict(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<[f32; CHANNELS]>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Calls a model server exposing `POST <url>` with `{"instances": [...]}`.
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: String) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn predict(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let body = PredictRequest {
            instances: vec![tensor.to_nested()],
        };
        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: PredictResponse = response.json().await?;
        parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::UnexpectedOutput("empty predictions".to_string()))
    }
}

/// Returns the index and value of the largest probability.
pub fn arg_max(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

/// Runs the model on a decoded image and resolves the arg-max label.
pub async fn classify(
    classifier: &dyn Classifier,
    image: &DynamicImage,
) -> Result<Classification, ClassifierError> {
    let tensor = to_tensor(image);
    let probabilities = classifier.predict(&tensor).await?;

    if probabilities.len() != LABELS.len() {
        return Err(ClassifierError::UnexpectedOutput(format!(
            "expected {} probabilities, got {}",
            LABELS.len(),
            probabilities.len()
        )));
    }
    debug!(?probabilities, "Model output");

    let (class_index, confidence) = arg_max(&probabilities)
        .ok_or_else(|| ClassifierError::UnexpectedOutput("no probabilities".to_string()))?;
    let entry = &LABELS[class_index];

    info!(code = entry.code, confidence, "Image classified");

    Ok(Classification {
        class_index,
        code: entry.code.to_string(),
        label: entry.name.to_string(),
        confidence,
    })
}
