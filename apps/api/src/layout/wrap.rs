//! Greedy word-wrap against a point-width budget.
//!
//! Packs as many words as fit on a line before breaking, never looks ahead.
//! A single word wider than the budget is emitted on its own line unbroken:
//! no hyphenation, no truncation.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{FontFamily, TextMeasure};

/// An ordered word sequence split from a source string on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    words: Vec<String>,
}

impl TextBlock {
    /// `None` and whitespace-only text both yield an empty block.
    pub fn new(text: Option<&str>) -> Self {
        let words = text
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One output line: consecutive words of a `TextBlock` plus their measured width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedLine {
    pub words: Vec<String>,
    /// Rendered width in points, including inter-word spaces.
    pub width: f32,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Wraps `text` into lines no wider than `max_width` points.
pub fn wrap_text(
    text: Option<&str>,
    max_width: f32,
    font: FontFamily,
    size_pt: f32,
    measure: &dyn TextMeasure,
) -> Vec<WrappedLine> {
    wrap_block(&TextBlock::new(text), max_width, font, size_pt, measure)
}

pub fn wrap_block(
    block: &TextBlock,
    max_width: f32,
    font: FontFamily,
    size_pt: f32,
    measure: &dyn TextMeasure,
) -> Vec<WrappedLine> {
    if block.is_empty() {
        return Vec::new();
    }

    let space_w = measure.measure(" ", font, size_pt);
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_width = 0.0_f32;

    for word in block.words() {
        let word_w = measure.measure(word, font, size_pt);
        let gap = if current.is_empty() { 0.0 } else { space_w };
        let candidate = current_width + gap + word_w;

        if candidate <= max_width {
            current.push(word.clone());
            current_width = candidate;
        } else {
            if !current.is_empty() {
                lines.push(WrappedLine {
                    words: std::mem::take(&mut current),
                    width: current_width,
                });
            }
            // Over-wide words still open a line of their own.
            current.push(word.clone());
            current_width = word_w;
        }
    }

    if !current.is_empty() {
        lines.push(WrappedLine {
            words: current,
            width: current_width,
        });
    }

    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::font_metrics::AfmMetrics;

    /// Deterministic metrics: 1 unit per character at 10pt, except `q` and `w`
    /// (3 units) and `k` (2 units). Scales linearly with size.
    pub(crate) struct StubMeasure;

    impl TextMeasure for StubMeasure {
        fn measure(&self, text: &str, _font: FontFamily, size_pt: f32) -> f32 {
            let units: f32 = text
                .chars()
                .map(|c| match c {
                    'q' | 'w' => 3.0,
                    'k' => 2.0,
                    _ => 1.0,
                })
                .sum();
            units * size_pt / 10.0
        }
    }

    const FOX: &str = "The quick brown fox jumps over the lazy dog";

    fn texts(lines: &[WrappedLine]) -> Vec<String> {
        lines.iter().map(WrappedLine::text).collect()
    }

    #[test]
    fn test_empty_string_yields_no_lines() {
        assert!(wrap_text(Some(""), 100.0, FontFamily::Helvetica, 10.0, &StubMeasure).is_empty());
    }

    #[test]
    fn test_absent_text_yields_no_lines() {
        assert!(wrap_text(None, 100.0, FontFamily::Helvetica, 10.0, &StubMeasure).is_empty());
    }

    #[test]
    fn test_whitespace_only_yields_no_lines() {
        let lines = wrap_text(Some(" \t\n  "), 100.0, FontFamily::Helvetica, 10.0, &StubMeasure);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_single_narrow_word_is_one_line() {
        let lines = wrap_text(Some("mole"), 100.0, FontFamily::Helvetica, 10.0, &StubMeasure);
        assert_eq!(texts(&lines), vec!["mole"]);
        assert_eq!(lines[0].width, 4.0);
    }

    #[test]
    fn test_single_overwide_word_is_emitted_unbroken() {
        let lines = wrap_text(
            Some("dermatofibroma"),
            5.0,
            FontFamily::Helvetica,
            10.0,
            &StubMeasure,
        );
        assert_eq!(texts(&lines), vec!["dermatofibroma"]);
        assert!(lines[0].width > 5.0);
    }

    #[test]
    fn test_overwide_word_between_short_words() {
        let lines = wrap_text(
            Some("a dermatofibroma b"),
            5.0,
            FontFamily::Helvetica,
            10.0,
            &StubMeasure,
        );
        assert_eq!(texts(&lines), vec!["a", "dermatofibroma", "b"]);
    }

    #[test]
    fn test_exact_fill_has_no_spurious_empty_line() {
        // "abc def" = 7 units exactly
        let lines = wrap_text(Some("abc def"), 7.0, FontFamily::Helvetica, 10.0, &StubMeasure);
        assert_eq!(texts(&lines), vec!["abc def"]);
        assert_eq!(lines[0].width, 7.0);
    }

    #[test]
    fn test_consecutive_whitespace_collapses() {
        let lines = wrap_text(
            Some("  no   family\t\thistory \n "),
            100.0,
            FontFamily::Helvetica,
            10.0,
            &StubMeasure,
        );
        assert_eq!(texts(&lines), vec!["no family history"]);
    }

    #[test]
    fn test_quick_brown_fox_example() {
        let budget = StubMeasure.measure("The quick brown", FontFamily::Helvetica, 10.0);
        let lines = wrap_text(Some(FOX), budget, FontFamily::Helvetica, 10.0, &StubMeasure);
        assert_eq!(
            texts(&lines),
            vec!["The quick brown", "fox jumps over the", "lazy dog"]
        );
    }

    #[test]
    fn test_lines_never_exceed_budget_with_real_metrics() {
        let text = "Patient reports a mole on the upper back that has grown over the \
                    last six months, with irregular borders and two distinct shades of brown. \
                    Father was treated for basal cell carcinoma in 2015.";
        for budget in [60.0_f32, 120.0, 250.0, 512.0] {
            let lines = wrap_text(Some(text), budget, FontFamily::Helvetica, 11.0, &AfmMetrics);
            for line in &lines {
                let measured = AfmMetrics.measure(&line.text(), FontFamily::Helvetica, 11.0);
                assert!(
                    measured <= budget + 1e-3 || line.words.len() == 1,
                    "line {:?} is {measured}pt over a {budget}pt budget",
                    line.text()
                );
            }
        }
    }

    #[test]
    fn test_wrap_preserves_word_sequence() {
        let lines = wrap_text(Some(FOX), 12.0, FontFamily::Helvetica, 10.0, &StubMeasure);
        let rejoined: Vec<String> = lines.into_iter().flat_map(|l| l.words).collect();
        let original: Vec<String> = FOX.split_whitespace().map(str::to_string).collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_lines_are_maximal() {
        let budget = 20.0;
        let lines = wrap_text(Some(FOX), budget, FontFamily::Helvetica, 10.0, &StubMeasure);
        for pair in lines.windows(2) {
            let with_next = format!("{} {}", pair[0].text(), pair[1].words[0]);
            assert!(StubMeasure.measure(&with_next, FontFamily::Helvetica, 10.0) > budget);
        }
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let first = wrap_text(Some(FOX), 30.0, FontFamily::HelveticaBold, 12.0, &AfmMetrics);
        let second = wrap_text(Some(FOX), 30.0, FontFamily::HelveticaBold, 12.0, &AfmMetrics);
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_block_words() {
        let block = TextBlock::new(Some(" a  b c "));
        assert_eq!(block.words(), ["a", "b", "c"]);
        assert!(TextBlock::new(None).is_empty());
    }
}
