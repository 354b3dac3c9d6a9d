//! Traits at the external service boundaries.
//!
//! The orchestrator only ever talks to the language model and to the
//! media extractors through these traits, so both can be swapped for
//! mocks in tests and for other providers in deployment.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ExtractError, ServiceError};
use crate::extraction::Extraction;
use crate::message::ChatMessage;

/// Free-text and structured generation backed by a language model.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Run a chat completion over the given messages and return the
    /// assistant's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError>;

    /// Ask for a JSON object and decode it leniently (outermost `{...}`
    /// span). Fails with [`ServiceError`] only for transport problems;
    /// a response that contains no decodable object is also an error
    /// here — the planner maps it to its fallback plan.
    async fn complete_structured(&self, prompt: &str) -> Result<Value, ServiceError>;
}

/// Media extractors, one method per supported attachment category.
///
/// Each method is a pure transformation `bytes -> Extraction`; failures
/// are recoverable at the dispatch site.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Read visible text out of an image.
    async fn image(&self, data: &[u8]) -> Result<Extraction, ExtractError>;

    /// Extract a PDF's text layer, falling back to per-page OCR when the
    /// layer yields fewer than 30 characters.
    async fn pdf(&self, data: &[u8]) -> Result<Extraction, ExtractError>;

    /// Transcribe an audio file. Duration may be a 0.0 placeholder.
    async fn audio(&self, data: &[u8], filename: &str) -> Result<Extraction, ExtractError>;
}
