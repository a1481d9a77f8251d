// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Output goes straight onto a PDF page set in a base-14 font.
pub const PLAIN_TEXT_INSTRUCTION: &str = "\
    Respond with plain prose only. \
    Do NOT use markdown, headings, bullet points, tables, or emoji. \
    Use only ASCII punctuation.";

/// Keeps generated explanations on the right side of medical advice.
pub const MEDICAL_SAFETY_INSTRUCTION: &str = "\
    CRITICAL: You are not diagnosing the user. The prediction comes from an automated \
    image classifier and may be wrong. Never state that the user has or does not have a \
    disease. Always recommend consulting a dermatologist or other qualified healthcare \
    provider, and recommend prompt consultation when the predicted lesion type is malignant.";
