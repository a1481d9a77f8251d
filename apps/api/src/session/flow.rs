//! Per-session flow as an explicit state machine.
//!
//! ```text
//! AwaitingDisclaimer --accept_disclaimer--> AwaitingProfile --submit_profile--> AwaitingImage
//!        |                                                                          |
//!        +--accept_disclaimer (profile already on file)-----------------------------+
//!                                                                                   |
//! AwaitingImage | Classified | ReportReady --record_upload--> Classified            v
//! Classified | ReportReady --record_report--> ReportReady
//! ```
//! Any other (state, action) pair is rejected with `FlowError::InvalidTransition`
//! and leaves the state untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::Classification;

/// The last image a user uploaded in this session, with its prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub classification: Classification,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    AwaitingDisclaimer,
    AwaitingProfile,
    AwaitingImage,
    Classified {
        upload: UploadedArtifact,
    },
    ReportReady {
        upload: UploadedArtifact,
        report_key: String,
    },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::AwaitingDisclaimer => "awaiting_disclaimer",
            FlowState::AwaitingProfile => "awaiting_profile",
            FlowState::AwaitingImage => "awaiting_image",
            FlowState::Classified { .. } => "classified",
            FlowState::ReportReady { .. } => "report_ready",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Everything the service remembers about one logged-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub state: FlowState,
}

impl SessionContext {
    pub fn new(user_id: Uuid, username: String) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            username,
            created_at: Utc::now(),
            state: FlowState::AwaitingDisclaimer,
        }
    }

    pub fn disclaimer_accepted(&self) -> bool {
        !matches!(self.state, FlowState::AwaitingDisclaimer)
    }

    pub fn form_submitted(&self) -> bool {
        !matches!(
            self.state,
            FlowState::AwaitingDisclaimer | FlowState::AwaitingProfile
        )
    }

    pub fn last_upload(&self) -> Option<&UploadedArtifact> {
        match &self.state {
            FlowState::Classified { upload } | FlowState::ReportReady { upload, .. } => Some(upload),
            _ => None,
        }
    }

    pub fn report_generated(&self) -> Option<&str> {
        match &self.state {
            FlowState::ReportReady { report_key, .. } => Some(report_key),
            _ => None,
        }
    }

    fn reject(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// A profile submitted in an earlier session skips the intake form.
    pub fn accept_disclaimer(&mut self, profile_on_file: bool) -> Result<(), FlowError> {
        match self.state {
            FlowState::AwaitingDisclaimer => {
                self.state = if profile_on_file {
                    FlowState::AwaitingImage
                } else {
                    FlowState::AwaitingProfile
                };
                Ok(())
            }
            _ => Err(self.reject("accept the disclaimer")),
        }
    }

    /// Updating the profile later keeps any upload or report in place.
    pub fn submit_profile(&mut self) -> Result<(), FlowError> {
        match self.state {
            FlowState::AwaitingDisclaimer => Err(self.reject("submit the profile")),
            FlowState::AwaitingProfile => {
                self.state = FlowState::AwaitingImage;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Uploads are accepted once the intake profile is in place.
    pub fn check_upload(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::AwaitingImage
            | FlowState::Classified { .. }
            | FlowState::ReportReady { .. } => Ok(()),
            _ => Err(self.reject("upload an image")),
        }
    }

    pub fn record_upload(&mut self, upload: UploadedArtifact) -> Result<(), FlowError> {
        self.check_upload()?;
        self.state = FlowState::Classified { upload };
        Ok(())
    }

    /// The classified upload a report would be built from.
    pub fn require_upload(&self) -> Result<&UploadedArtifact, FlowError> {
        self.last_upload()
            .ok_or_else(|| self.reject("generate a report"))
    }

    pub fn record_report(&mut self, report_key: String) -> Result<(), FlowError> {
        let upload = self.require_upload()?.clone();
        self.state = FlowState::ReportReady { upload, report_key };
        Ok(())
    }
}
