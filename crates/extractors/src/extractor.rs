//! The media extractor wired up over OCR and PDF backends.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline_core::{ContentExtractor, ExtractError, Extraction, SourceKind};
use tracing::{debug, info};

use crate::ocr::OcrService;
use crate::pdf::{aggregate_confidence, PdfBackend, TEXT_LAYER_MIN_CHARS};

/// Production implementation of [`ContentExtractor`].
pub struct MediaExtractor {
    ocr: Arc<dyn OcrService>,
    pdf: Arc<dyn PdfBackend>,
}

impl MediaExtractor {
    /// Create an extractor over explicit OCR and PDF backends.
    pub fn new(ocr: Arc<dyn OcrService>, pdf: Arc<dyn PdfBackend>) -> Self {
        Self { ocr, pdf }
    }

    /// Run a blocking PDF backend call off the async executor.
    async fn run_pdf<T, F>(&self, f: F) -> Result<T, ExtractError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PdfBackend) -> Result<T, ExtractError> + Send + 'static,
    {
        let backend = self.pdf.clone();
        tokio::task::spawn_blocking(move || f(backend.as_ref()))
            .await
            .map_err(|e| ExtractError::Unavailable(format!("blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl ContentExtractor for MediaExtractor {
    async fn image(&self, data: &[u8]) -> Result<Extraction, ExtractError> {
        let mime = image_mime(data);
        let text = self.ocr.read_image(data, mime).await?;
        debug!(chars = text.len(), mime, "image OCR complete");
        Ok(Extraction::with_confidence(text, SourceKind::Image, 1.0))
    }

    async fn pdf(&self, data: &[u8]) -> Result<Extraction, ExtractError> {
        let bytes = data.to_vec();
        let pages = self.run_pdf(move |pdf| pdf.text_layer(&bytes)).await?;
        let layer_text = pages.join("\n").trim().to_string();

        if layer_text.len() >= TEXT_LAYER_MIN_CHARS {
            debug!(chars = layer_text.len(), "PDF text layer used");
            return Ok(Extraction::with_confidence(layer_text, SourceKind::Pdf, 1.0));
        }

        // Thin or missing text layer: rasterize and OCR every page.
        info!(
            layer_chars = layer_text.len(),
            "PDF text layer too thin, falling back to OCR"
        );
        let bytes = data.to_vec();
        let rendered = self.run_pdf(move |pdf| pdf.render_pages(&bytes)).await?;

        let mut page_texts = Vec::new();
        let mut confidences = Vec::new();
        for (index, png) in rendered.iter().enumerate() {
            let text = self.ocr.read_image(png, "image/png").await?;
            // Vision OCR reports no per-token confidence; score a page
            // 1.0 when it yields text and 0.0 when it comes back blank.
            confidences.push(if text.trim().is_empty() { 0.0 } else { 1.0 });
            debug!(page = index, chars = text.len(), "OCR page complete");
            page_texts.push(text);
        }

        let text = page_texts.join("\n").trim().to_string();
        let confidence = aggregate_confidence(&confidences);
        Ok(Extraction::with_confidence(text, SourceKind::Pdf, confidence))
    }

    async fn audio(&self, data: &[u8], filename: &str) -> Result<Extraction, ExtractError> {
        let name = if filename.is_empty() { "audio" } else { filename };
        let text = self.ocr.transcribe(data.to_vec(), name).await?;
        debug!(chars = text.len(), filename = name, "audio transcribed");

        let mut extraction = Extraction::text_only(text, SourceKind::Audio);
        // Duration is not computed here; 0.0 is the documented placeholder.
        extraction.duration_seconds = Some(0.0);
        Ok(extraction)
    }
}

/// Guess an image MIME type from magic bytes; defaults to PNG.
fn image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else {
        "image/png"
    }
}
