use std::sync::Arc;

use crate::classifier::Classifier;
use crate::layout::LayoutConfig;
use crate::narrative::NarrativeGenerator;
use crate::session::SessionStore;
use crate::storage::ArtifactStore;
use crate::users::UserStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Uploaded images and generated PDFs.
    pub artifacts: Arc<dyn ArtifactStore>,
    pub classifier: Arc<dyn Classifier>,
    pub narrator: Arc<dyn NarrativeGenerator>,
    /// Page geometry and type sizes for the report layout.
    pub layout: LayoutConfig,
}
