//! AI-generated explanation paragraph for the report.
//!
//! All LLM calls go through `llm_client`. A failed call is fatal for the
//! report attempt; there is no canned fallback text.

use async_trait::async_trait;

use crate::classifier::Classification;
use crate::errors::AppError;
use crate::layout::font_metrics::to_font_text;
use crate::layout::report::{format_confidence, PLACEHOLDER};
use crate::llm_client::prompts::{MEDICAL_SAFETY_INSTRUCTION, PLAIN_TEXT_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::user::UserProfile;

pub mod prompts;

use prompts::{NARRATIVE_PROMPT_TEMPLATE, NARRATIVE_SYSTEM};

/// Lesion codes that are malignant or pre-malignant.
const MALIGNANT_CODES: [&str; 3] = ["mel", "bcc", "akiec"];

/// Produces the explanation paragraph. Carried in `AppState` as `Arc<dyn NarrativeGenerator>`.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn explain(
        &self,
        profile: &UserProfile,
        classification: &Classification,
    ) -> Result<String, AppError>;
}

pub struct LlmNarrator(pub LlmClient);

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    async fn explain(
        &self,
        profile: &UserProfile,
        classification: &Classification,
    ) -> Result<String, AppError> {
        let prompt = build_narrative_prompt(profile, classification);
        let system = build_system_prompt();
        let text = self
            .0
            .call_text(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Narrative generation failed: {e}")))?;
        Ok(sanitize_narrative(&text))
    }
}

pub(crate) fn build_system_prompt() -> String {
    format!("{NARRATIVE_SYSTEM}\n\n{PLAIN_TEXT_INSTRUCTION}\n\n{MEDICAL_SAFETY_INSTRUCTION}")
}

pub(crate) fn build_narrative_prompt(profile: &UserProfile, classification: &Classification) -> String {
    let or_none = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string()
    };
    let risk = if MALIGNANT_CODES.contains(&classification.code.as_str()) {
        "malignant or pre-malignant"
    } else {
        "usually benign"
    };

    NARRATIVE_PROMPT_TEMPLATE
        .replace("{label}", &classification.label)
        .replace("{code}", &classification.code)
        .replace("{risk}", risk)
        .replace("{confidence}", &format_confidence(classification.confidence))
        .replace("{age}", &profile.age.to_string())
        .replace("{gender}", profile.gender.as_str())
        .replace("{family_history}", &or_none(&profile.family_history))
        .replace("{previous_conditions}", &or_none(&profile.previous_conditions))
        .replace("{smoking}", profile.smoking_habits.as_str())
        .replace("{alcohol}", profile.alcohol_consumption.as_str())
}

/// Maps model output onto characters the base-14 PDF fonts can draw and drops
/// markdown emphasis markers.
pub fn sanitize_narrative(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !matches!(c, '*' | '#' | '`')).collect();
    to_font_text(&stripped).trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::user::{AlcoholConsumption, Gender, SmokingHabits};

    /// Returns canned text, or fails like an unreachable API.
    pub(crate) struct CannedNarrator(pub Option<String>);

    #[async_trait]
    impl NarrativeGenerator for CannedNarrator {
        async fn explain(
            &self,
            _profile: &UserProfile,
            _classification: &Classification,
        ) -> Result<String, AppError> {
            self.0
                .clone()
                .ok_or_else(|| AppError::Llm("narrative service unavailable".to_string()))
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Ravi Kulkarni".to_string(),
            age: 58,
            gender: Gender::Male,
            family_history: Some("Father had basal cell carcinoma".to_string()),
            previous_conditions: Some("  ".to_string()),
            smoking_habits: SmokingHabits::Regular,
            alcohol_consumption: AlcoholConsumption::Frequent,
            contact_email: "ravi@example.com".to_string(),
        }
    }

    fn classification(code: &str, label: &str) -> Classification {
        Classification {
            class_index: 0,
            code: code.to_string(),
            label: label.to_string(),
            confidence: 0.8734,
        }
    }

    #[test]
    fn test_prompt_includes_prediction_and_profile() {
        let prompt = build_narrative_prompt(&profile(), &classification("mel", "Melanoma"));
        assert!(prompt.contains("PREDICTED TYPE: Melanoma (mel)"));
        assert!(prompt.contains("CLASSIFIER CONFIDENCE: 87.34%"));
        assert!(prompt.contains("Father had basal cell carcinoma"));
        assert!(prompt.contains("Smoking: Regular"));
        assert!(prompt.contains("malignant or pre-malignant"));
        assert!(!prompt.contains('{'), "unfilled placeholder in {prompt}");
    }

    #[test]
    fn test_prompt_substitutes_blank_history() {
        let prompt = build_narrative_prompt(&profile(), &classification("nv", "Melanocytic Nevi"));
        assert!(prompt.contains("Previous conditions: None provided"));
        assert!(prompt.contains("usually benign"));
    }

    #[test]
    fn test_system_prompt_carries_safety_instruction() {
        let system = build_system_prompt();
        assert!(system.contains("not diagnosing"));
        assert!(system.contains("plain prose"));
    }

    #[test]
    fn test_sanitize_normalizes_typography() {
        let raw = "  **Melanoma** \u{2014} it\u{2019}s \u{201C}serious\u{201D}\u{2026} ✅ ";
        assert_eq!(sanitize_narrative(raw), "Melanoma - it's \"serious\"...");
    }

    #[tokio::test]
    async fn test_canned_narrator_failure_is_llm_error() {
        let narrator = CannedNarrator(None);
        let err = narrator
            .explain(&profile(), &classification("mel", "Melanoma"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
