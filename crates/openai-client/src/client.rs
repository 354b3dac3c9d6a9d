//! OpenAI client implementation.

use std::time::Duration;

use base64::Engine;
use pipeline_core::{
    async_trait, extract_json_object, ChatMessage, ServiceError, TextService,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api_types::{ApiErrorBody, ApiMessage, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiConfig;

/// Base delay for the retry backoff schedule.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// System prompt used for structured (JSON-only) requests.
const JSON_SYSTEM_PROMPT: &str =
    "You are a strict JSON generator. Always return ONLY a valid JSON object.";

/// Instruction used for vision OCR requests.
const VISION_OCR_PROMPT: &str =
    "Extract all visible text from this image. Return plain text only.";

/// Client for OpenAI chat completions, vision, and transcription.
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ServiceError> {
        if config.api_key.is_empty() {
            return Err(ServiceError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ServiceError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        info!(
            model = %config.model,
            whisper_model = %config.whisper_model,
            timeout_secs = config.timeout.as_secs(),
            "OpenAI client initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the recognized variables.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Run a chat completion, retrying retryable failures with bounded
    /// exponential backoff.
    async fn chat_completion(
        &self,
        messages: &[ApiMessage],
        temperature: Option<f32>,
    ) -> Result<String, ServiceError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature,
        };

        let mut attempt = 0u32;
        loop {
            match self.send_chat(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "chat completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One chat completion attempt.
    async fn send_chat(&self, request: &ChatCompletionRequest) -> Result<String, ServiceError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Network(format!("failed to decode response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        completion
            .first_text()
            .map(|s| s.to_string())
            .ok_or(ServiceError::EmptyResponse)
    }

    /// Read visible text out of an image via the vision model.
    ///
    /// The image is inlined as a base64 data URL; generation runs at
    /// temperature 0 so identical images read identically.
    pub async fn vision_extract(&self, image: &[u8], mime: &str) -> Result<String, ServiceError> {
        let b64 = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{};base64,{}", mime, b64);

        let messages = vec![ApiMessage::user_with_image(VISION_OCR_PROMPT, data_url)];
        let text = self.chat_completion(&messages, Some(0.0)).await?;
        Ok(text.trim().to_string())
    }

    /// Transcribe audio through the transcriptions endpoint.
    pub async fn transcribe(&self, data: Vec<u8>, filename: &str) -> Result<String, ServiceError> {
        let url = format!("{}/v1/audio/transcriptions", self.config.api_url);

        let file_part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new()
            .text("model", self.config.whisper_model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl TextService for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        let api_messages: Vec<ApiMessage> = messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: crate::api_types::MessageContent::Text(m.content.clone()),
            })
            .collect();

        self.chat_completion(&api_messages, self.config.temperature)
            .await
    }

    async fn complete_structured(&self, prompt: &str) -> Result<Value, ServiceError> {
        let messages = vec![
            ApiMessage::system(JSON_SYSTEM_PROMPT),
            ApiMessage::user(prompt),
        ];

        // Classification must be deterministic: always temperature 0.
        let raw = self.chat_completion(&messages, Some(0.0)).await?;

        let json_str = extract_json_object(&raw)
            .ok_or_else(|| ServiceError::Malformed(truncate_for_log(&raw)))?;

        serde_json::from_str(json_str).map_err(|e| {
            ServiceError::Malformed(format!("{}: {}", e, truncate_for_log(json_str)))
        })
    }
}

/// Map a reqwest transport error to a [`ServiceError`].
fn map_transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Build an API error from a non-2xx response body.
fn api_error(status: u16, body: &str) -> ServiceError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => truncate_for_log(body),
    };
    ServiceError::Api { status, message }
}

/// Cap untrusted response text before it lands in an error message.
fn truncate_for_log(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
