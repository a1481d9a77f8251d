//! Report layout sequencer: stacks the report sections onto one US Letter page.
//!
//! # Section order (fixed)
//! 0. title and generation date
//! 1. identity fields, wrapped at the text width
//! 2. medical history, label line + wrapped body per field
//! 3. uploaded image, aspect-preserving, fit inside a fixed box
//! 4. prediction and confidence, each underlined
//! 5. narrative explanation, wrapped at its own width and size
//! 6. disclaimer, pinned above the page bottom independent of the cursor
//!
//! Coordinates are PDF points with the origin at the bottom-left corner, so
//! the cursor starts near the top of the page and only decreases.
//! Every element occupies `[y - height, y]` and must stay above
//! `LayoutConfig::content_floor`; otherwise the whole layout fails with
//! `LayoutError::PageOverflow` and no partial document is returned.
//! All text is folded onto the ASCII range the base-14 fonts can draw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::Classification;
use crate::layout::font_metrics::{to_font_text, FontFamily, TextMeasure};
use crate::layout::wrap::wrap_text;
use crate::models::user::UserProfile;

pub const PLACEHOLDER: &str = "None provided";
pub const REPORT_TITLE: &str = "Skin Lesion Analysis Report";
pub const DISCLAIMER: &str =
    "This report is not a substitute for professional medical advice, diagnosis, or treatment.";

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry and typography for the report. All lengths are in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    /// Initial cursor position.
    pub top_y: f32,
    pub title_size: f32,
    pub title_line_height: f32,
    pub body_size: f32,
    pub line_height: f32,
    /// Wrap budget for medical-history bodies.
    pub text_width: f32,
    pub section_gap: f32,
    /// The image is scaled to fit inside `image_width × max_image_height`.
    pub image_width: f32,
    pub max_image_height: f32,
    pub image_margin: f32,
    pub underline_offset: f32,
    pub rule_thickness: f32,
    pub narrative_width: f32,
    pub narrative_size: f32,
    pub narrative_line_height: f32,
    pub disclaimer_y: f32,
    pub disclaimer_size: f32,
    /// Clearance kept between the lowest content and the disclaimer.
    pub disclaimer_clearance: f32,
}

impl LayoutConfig {
    /// US Letter (612 × 792pt), content starting 42pt below the top edge.
    pub fn us_letter() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_left: 50.0,
            top_y: 750.0,
            title_size: 16.0,
            title_line_height: 24.0,
            body_size: 12.0,
            line_height: 20.0,
            text_width: 500.0,
            section_gap: 10.0,
            image_width: 200.0,
            max_image_height: 160.0,
            image_margin: 20.0,
            underline_offset: 2.0,
            rule_thickness: 0.75,
            narrative_width: 500.0,
            narrative_size: 11.0,
            narrative_line_height: 15.0,
            disclaimer_y: 30.0,
            disclaimer_size: 8.0,
            disclaimer_clearance: 10.0,
        }
    }

    /// Lowest y any cursor-placed element may reach.
    pub fn content_floor(&self) -> f32 {
        self.disclaimer_y + self.disclaimer_clearance
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::us_letter()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document types
// ────────────────────────────────────────────────────────────────────────────

/// One absolutely positioned drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: FontFamily,
        size: f32,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    /// `(x, y)` is the bottom-left corner of the placement box.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// The assembled, single-page report ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub page_width: f32,
    pub page_height: f32,
    pub ops: Vec<DrawOp>,
    pub cursor_start: f32,
    pub cursor_end: f32,
}

impl ReportDocument {
    /// Text of every text op, in emission order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_placement(&self) -> Option<&DrawOp> {
        self.ops.iter().find(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// Everything the sequencer needs for one report.
pub struct ReportInput<'a> {
    pub profile: &'a UserProfile,
    pub classification: &'a Classification,
    /// Pixel dimensions of the uploaded image.
    pub image_size: (u32, u32),
    pub narrative: &'a str,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("report content reaches y={reached:.1}pt, below the page floor at {floor:.1}pt")]
    PageOverflow { reached: f32, floor: f32 },

    #[error("uploaded image has zero width or height")]
    EmptyImage,
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Next free vertical position on the page. Owned by one layout run.
#[derive(Debug)]
pub struct LayoutCursor {
    y: f32,
    floor: f32,
}

impl LayoutCursor {
    pub fn new(top_y: f32, floor: f32) -> Self {
        Self { y: top_y, floor }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Claims `height` below the cursor for an element and returns the y the
    /// element starts at. Fails if the element would cross the floor.
    pub fn place(&mut self, height: f32) -> Result<f32, LayoutError> {
        debug_assert!(height >= 0.0);
        let top = self.y;
        let bottom = top - height;
        if bottom < self.floor {
            return Err(LayoutError::PageOverflow {
                reached: bottom,
                floor: self.floor,
            });
        }
        self.y = bottom;
        Ok(top)
    }

    /// Moves down without placing anything.
    pub fn skip(&mut self, gap: f32) {
        debug_assert!(gap >= 0.0);
        self.y -= gap;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sequencer
// ────────────────────────────────────────────────────────────────────────────

/// Formats a probability in `[0, 1]` as a percentage with two decimals.
pub fn format_confidence(probability: f32) -> String {
    format!("{:.2}%", probability * 100.0)
}

fn or_placeholder(text: Option<&str>) -> &str {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => PLACEHOLDER,
    }
}

struct Sequencer<'a> {
    config: &'a LayoutConfig,
    measure: &'a dyn TextMeasure,
    cursor: LayoutCursor,
    ops: Vec<DrawOp>,
}

impl<'a> Sequencer<'a> {
    fn line(
        &mut self,
        text: impl Into<String>,
        font: FontFamily,
        size: f32,
        line_height: f32,
    ) -> Result<f32, LayoutError> {
        let text: String = text.into();
        let y = self.cursor.place(line_height)?;
        self.ops.push(DrawOp::Text {
            x: self.config.margin_left,
            y,
            text: to_font_text(&text),
            font,
            size,
        });
        Ok(y)
    }

    fn underlined_line(&mut self, text: String, font: FontFamily, size: f32) -> Result<(), LayoutError> {
        let text = to_font_text(&text);
        let width = self.measure.measure(&text, font, size);
        let y = self.line(text, font, size, self.config.line_height)?;
        let rule_y = y - self.config.underline_offset;
        self.ops.push(DrawOp::Rule {
            x1: self.config.margin_left,
            y1: rule_y,
            x2: self.config.margin_left + width,
            y2: rule_y,
            thickness: self.config.rule_thickness,
        });
        Ok(())
    }

    fn wrapped(
        &mut self,
        text: &str,
        width: f32,
        size: f32,
        line_height: f32,
    ) -> Result<(), LayoutError> {
        let text = to_font_text(text);
        for line in wrap_text(Some(&text), width, FontFamily::Helvetica, size, self.measure) {
            self.line(line.text(), FontFamily::Helvetica, size, line_height)?;
        }
        Ok(())
    }

    fn image(&mut self, (px_w, px_h): (u32, u32)) -> Result<(), LayoutError> {
        if px_w == 0 || px_h == 0 {
            return Err(LayoutError::EmptyImage);
        }
        let scale = (self.config.image_width / px_w as f32)
            .min(self.config.max_image_height / px_h as f32);
        let width = px_w as f32 * scale;
        let height = px_h as f32 * scale;
        let top = self.cursor.place(height)?;
        self.ops.push(DrawOp::Image {
            x: self.config.margin_left,
            y: top - height,
            width,
            height,
        });
        self.cursor.skip(self.config.image_margin);
        Ok(())
    }
}

/// Lays out a full report. Pure: the only output is the returned document.
pub fn layout_report(
    input: &ReportInput<'_>,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Result<ReportDocument, LayoutError> {
    let mut seq = Sequencer {
        config,
        measure,
        cursor: LayoutCursor::new(config.top_y, config.content_floor()),
        ops: Vec::new(),
    };
    let body = config.body_size;
    let lh = config.line_height;
    let profile = input.profile;

    // 0. Title
    seq.line(
        REPORT_TITLE,
        FontFamily::HelveticaBold,
        config.title_size,
        config.title_line_height,
    )?;
    seq.line(
        format!("Generated: {}", input.generated_at.format("%Y-%m-%d %H:%M UTC")),
        FontFamily::Helvetica,
        body,
        lh,
    )?;
    seq.cursor.skip(config.section_gap);

    // 1. Identity
    let identity = [
        format!("Full Name: {}", profile.full_name),
        format!("Age: {}", profile.age),
        format!("Gender: {}", profile.gender),
        format!("Smoking Habits: {}", profile.smoking_habits),
        format!("Alcohol Consumption: {}", profile.alcohol_consumption),
        format!("Contact Email: {}", profile.contact_email),
    ];
    for field in identity {
        seq.wrapped(&field, config.text_width, body, lh)?;
    }
    seq.cursor.skip(config.section_gap);

    // 2. Medical history
    let history = [
        ("Family History:", profile.family_history.as_deref()),
        ("Previous Conditions:", profile.previous_conditions.as_deref()),
    ];
    for (label, text) in history {
        seq.line(label, FontFamily::HelveticaBold, body, lh)?;
        seq.wrapped(or_placeholder(text), config.text_width, body, lh)?;
    }
    seq.cursor.skip(config.section_gap);

    // 3. Image
    seq.image(input.image_size)?;

    // 4. Results
    let result = input.classification;
    seq.underlined_line(
        format!("Prediction: {} ({})", result.label, result.code),
        FontFamily::HelveticaBold,
        body,
    )?;
    seq.underlined_line(
        format!("Confidence: {}", format_confidence(result.confidence)),
        FontFamily::HelveticaBold,
        body,
    )?;
    seq.cursor.skip(config.section_gap);

    // 5. Narrative
    seq.line("AI Explanation:", FontFamily::HelveticaBold, body, lh)?;
    seq.wrapped(
        input.narrative,
        config.narrative_width,
        config.narrative_size,
        config.narrative_line_height,
    )?;

    let cursor_end = seq.cursor.y();

    // 6. Disclaimer, outside the cursor flow.
    seq.ops.push(DrawOp::Text {
        x: config.margin_left,
        y: config.disclaimer_y,
        text: DISCLAIMER.to_string(),
        font: FontFamily::HelveticaOblique,
        size: config.disclaimer_size,
    });

    Ok(ReportDocument {
        page_width: config.page_width,
        page_height: config.page_height,
        ops: seq.ops,
        cursor_start: config.top_y,
        cursor_end,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
