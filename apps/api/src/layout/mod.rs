// Report layout: font metrics, greedy word-wrap, and the single-page section sequencer.
// Everything here is pure and synchronous; rendering to PDF lives in `render`.

pub mod font_metrics;
pub mod report;
pub mod wrap;

// Re-export the public API consumed by handlers and the renderer.
pub use font_metrics::AfmMetrics;
pub use report::{layout_report, DrawOp, LayoutConfig, LayoutError, ReportDocument, ReportInput};
