//! OCR and transcription service boundary.

use async_trait::async_trait;
use openai_client::OpenAiClient;
use pipeline_core::ServiceError;

/// Vision OCR and audio transcription, as used by the extractors.
///
/// Separated from the concrete client so extractor logic (especially the
/// PDF fallback path) can be tested without network access.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Read all visible text from an image.
    async fn read_image(&self, image: &[u8], mime: &str) -> Result<String, ServiceError>;

    /// Transcribe an audio file to text.
    async fn transcribe(&self, data: Vec<u8>, filename: &str) -> Result<String, ServiceError>;
}

#[async_trait]
impl OcrService for OpenAiClient {
    async fn read_image(&self, image: &[u8], mime: &str) -> Result<String, ServiceError> {
        self.vision_extract(image, mime).await
    }

    async fn transcribe(&self, data: Vec<u8>, filename: &str) -> Result<String, ServiceError> {
        OpenAiClient::transcribe(self, data, filename).await
    }
}
