//! Prompt constants for the report narrative.

pub const NARRATIVE_SYSTEM: &str = "\
You are a patient-education assistant writing one short paragraph for a skin-lesion \
screening report. Explain in plain, calm language what the predicted lesion type is, \
what the confidence value means for an automated classifier, and which of the user's \
risk factors are relevant. Keep it under 120 words.";

pub const NARRATIVE_PROMPT_TEMPLATE: &str = "\
An image classifier analysed a photo of a skin lesion.\n\
\n\
PREDICTED TYPE: {label} ({code})\n\
RISK CATEGORY: {risk}\n\
CLASSIFIER CONFIDENCE: {confidence}\n\
\n\
USER PROFILE:\n\
- Age: {age}\n\
- Gender: {gender}\n\
- Family history: {family_history}\n\
- Previous conditions: {previous_conditions}\n\
- Smoking: {smoking}\n\
- Alcohol: {alcohol}\n\
\n\
Write the explanation paragraph now.";
