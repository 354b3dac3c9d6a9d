//! Content extractors for the analysis pipeline.
//!
//! [`MediaExtractor`] implements [`pipeline_core::ContentExtractor`]:
//!
//! - images go to a vision model for OCR;
//! - PDFs use the embedded text layer, falling back to per-page
//!   render-and-OCR when the layer is too thin;
//! - audio goes to a transcription endpoint;
//! - video links resolve to platform transcripts (sentinel strings on
//!   failure, never errors).
//!
//! All extractors are pure `bytes -> text` transformations; failures are
//! recoverable at the orchestrator's dispatch site.

mod extractor;
mod ocr;
mod pdf;
mod video;

pub use extractor::MediaExtractor;
pub use ocr::OcrService;
pub use pdf::{aggregate_confidence, PdfBackend, PdfiumBackend, TEXT_LAYER_MIN_CHARS};
pub use video::{extract_video_id, fetch_video_transcript, NO_TRANSCRIPT, NO_VIDEO_ID};
