//! PDF rendering for laid-out reports using `printpdf` 0.8.
//!
//! printpdf 0.8 is data-oriented: a page is a `Vec<Op>` serialised by
//! `PdfDocument::save()`. Each `DrawOp` maps to a short run of ops. Coordinates
//! from the layout are already PDF points from the bottom-left corner.

use image::DynamicImage;
use printpdf::{
    Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage, RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::layout::{DrawOp, ReportDocument};

const PDF_TITLE: &str = "Skin Lesion Analysis Report";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image has zero width or height")]
    EmptyImage,
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn point(x: f32, y: f32) -> Point {
    Point { x: Pt(x), y: Pt(y) }
}

/// Renders a laid-out report to PDF bytes. `image` fills the document's image placement.
#[instrument(skip_all, fields(ops = doc.ops.len()))]
pub fn render_pdf(doc: &ReportDocument, image: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut pdf = PdfDocument::new(PDF_TITLE);
    let mut ops: Vec<Op> = Vec::new();

    for draw in &doc.ops {
        match draw {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
            } => {
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor { pos: point(*x, *y) });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(*size),
                    font: font.builtin(),
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(text.clone())],
                    font: font.builtin(),
                });
                ops.push(Op::EndTextSection);
            }
            DrawOp::Rule {
                x1,
                y1,
                x2,
                y2,
                thickness,
            } => {
                ops.push(Op::SetOutlineThickness { pt: Pt(*thickness) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![
                            LinePoint {
                                p: point(*x1, *y1),
                                bezier: false,
                            },
                            LinePoint {
                                p: point(*x2, *y2),
                                bezier: false,
                            },
                        ],
                        is_closed: false,
                    },
                });
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
            } => {
                let (px_w, px_h) = (image.width(), image.height());
                if px_w == 0 || px_h == 0 {
                    return Err(RenderError::EmptyImage);
                }
                let rgb = image.to_rgb8();
                let raw = RawImage {
                    pixels: RawImageData::U8(rgb.into_raw()),
                    width: px_w as usize,
                    height: px_h as usize,
                    data_format: RawImageFormat::RGB8,
                    tag: Vec::new(),
                };
                let xobject_id = pdf.add_image(&raw);

                // At 72 dpi one pixel is one point, so scale maps pixels onto the box.
                ops.push(Op::UseXobject {
                    id: xobject_id,
                    transform: XObjectTransform {
                        translate_x: Some(Pt(*x)),
                        translate_y: Some(Pt(*y)),
                        scale_x: Some(width / px_w as f32),
                        scale_y: Some(height / px_h as f32),
                        dpi: Some(72.0),
                        rotate: None,
                    },
                });
            }
        }
    }

    let page = PdfPage::new(pt_to_mm(doc.page_width), pt_to_mm(doc.page_height), ops);
    pdf.with_pages(vec![page]);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = pdf.save(&PdfSaveOptions::default(), &mut warnings);

    debug!(bytes = output.len(), warnings = warnings.len(), "Report PDF rendered");
    Ok(output)
}
