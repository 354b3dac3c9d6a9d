//! Extraction results returned by content extractors.

use serde::{Deserialize, Serialize};

/// Where extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    Image,
    Pdf,
    Audio,
    Video,
    Unknown,
}

/// The output of one extractor invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// Extracted plain text (may be empty).
    pub text: String,
    /// Source category the text was derived from.
    pub source: SourceKind,
    /// Advisory extraction confidence in `[0, 1]`, when the extractor
    /// computes one (OCR paths). Not consumed by the orchestrator beyond
    /// the trace.
    pub confidence: Option<f32>,
    /// Audio duration in seconds; 0.0 is a valid placeholder.
    pub duration_seconds: Option<f64>,
}

impl Extraction {
    /// Plain text with no confidence attached.
    pub fn text_only(text: impl Into<String>, source: SourceKind) -> Self {
        Self {
            text: text.into(),
            source,
            confidence: None,
            duration_seconds: None,
        }
    }

    /// Text plus an advisory confidence.
    pub fn with_confidence(text: impl Into<String>, source: SourceKind, confidence: f32) -> Self {
        Self {
            text: text.into(),
            source,
            confidence: Some(confidence),
            duration_seconds: None,
        }
    }
}
