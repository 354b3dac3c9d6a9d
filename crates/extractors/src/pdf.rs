//! PDF backend: text-layer extraction and page rasterization.

use std::io::Cursor;

use pdfium_render::prelude::*;
use pipeline_core::ExtractError;
use tracing::debug;

/// Minimum characters the embedded text layer must yield before the OCR
/// fallback kicks in.
pub const TEXT_LAYER_MIN_CHARS: usize = 30;

/// Render resolution for the OCR fallback.
const RENDER_DPI: f32 = 150.0;
const POINTS_PER_INCH: f32 = 72.0;

/// Cap on rendered page dimensions, to bound memory and upload size.
const MAX_DIMENSION_PX: i32 = 2048;

/// Blocking PDF operations, implemented by PDFium in production and by
/// mocks in tests.
pub trait PdfBackend: Send + Sync {
    /// Per-page embedded text layer.
    fn text_layer(&self, data: &[u8]) -> Result<Vec<String>, ExtractError>;

    /// Render every page to a PNG for OCR.
    fn render_pages(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, ExtractError>;
}

/// Mean of per-page OCR confidences; 0.0 when no page produced one.
pub fn aggregate_confidence(page_confidences: &[f32]) -> f32 {
    if page_confidences.is_empty() {
        return 0.0;
    }
    page_confidences.iter().sum::<f32>() / page_confidences.len() as f32
}

/// PDFium-backed implementation of [`PdfBackend`].
#[derive(Debug, Default)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    pub fn new() -> Self {
        Self
    }

    fn load_pdfium() -> Result<Pdfium, ExtractError> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| ExtractError::Unavailable(format!("PDFium library not found: {}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PdfBackend for PdfiumBackend {
    fn text_layer(&self, data: &[u8]) -> Result<Vec<String>, ExtractError> {
        let pdfium = Self::load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| ExtractError::unreadable("pdf", e.to_string()))?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let text = page.text().map(|t| t.all()).unwrap_or_default();
            pages.push(text);
        }
        Ok(pages)
    }

    fn render_pages(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, ExtractError> {
        let pdfium = Self::load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| ExtractError::unreadable("pdf", e.to_string()))?;

        let mut rendered = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let scale = RENDER_DPI / POINTS_PER_INCH;
            let width = ((page.width().value * scale) as i32).clamp(1, MAX_DIMENSION_PX);

            let config = PdfRenderConfig::new()
                .set_target_width(width)
                .set_maximum_height(MAX_DIMENSION_PX);

            let bitmap = page.render_with_config(&config).map_err(|e| {
                ExtractError::unreadable("pdf", format!("page {} render failed: {}", index, e))
            })?;

            let mut cursor = Cursor::new(Vec::new());
            bitmap
                .as_image()
                .write_to(&mut cursor, image::ImageOutputFormat::Png)
                .map_err(|e| {
                    ExtractError::unreadable("pdf", format!("PNG encoding failed: {}", e))
                })?;

            let png = cursor.into_inner();
            debug!(page = index, png_size = png.len(), "rendered PDF page");
            rendered.push(png);
        }
        Ok(rendered)
    }
}
