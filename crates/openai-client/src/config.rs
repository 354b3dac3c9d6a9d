//! Configuration for the OpenAI client.

use std::env;
use std::time::Duration;

use pipeline_core::ServiceError;

/// Configuration for [`crate::OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Chat/vision model name.
    pub model: String,

    /// Transcription model name.
    pub whisper_model: String,

    /// Maximum tokens for completions.
    pub max_tokens: Option<u32>,

    /// Temperature for free-text generation. Structured classification
    /// and vision OCR always run at 0.0 regardless of this value.
    pub temperature: Option<f32>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Bounded retry budget for retryable failures (429/5xx/timeouts).
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            whisper_model: "whisper-1".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.2),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional:
    /// - `OPENAI_API_URL` - base URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - chat/vision model (default: gpt-4o-mini)
    /// - `OPENAI_WHISPER_MODEL` - transcription model (default: whisper-1)
    /// - `OPENAI_MAX_TOKENS` - max completion tokens (default: 1024)
    /// - `OPENAI_TEMPERATURE` - generation temperature (default: 0.2)
    /// - `OPENAI_TIMEOUT_SECS` - per-request timeout (default: 60)
    /// - `OPENAI_MAX_RETRIES` - retry budget (default: 2)
    pub fn from_env() -> Result<Self, ServiceError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ServiceError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("OPENAI_MODEL").unwrap_or(defaults.model);
        let whisper_model = env::var("OPENAI_WHISPER_MODEL").unwrap_or(defaults.whisper_model);

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        let timeout = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_retries = env::var("OPENAI_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_retries);

        Ok(Self {
            api_url,
            api_key,
            model,
            whisper_model,
            max_tokens,
            temperature,
            timeout,
            max_retries,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for [`OpenAiConfig`].
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the chat/vision model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the transcription model name.
    pub fn whisper_model(mut self, model: impl Into<String>) -> Self {
        self.config.whisper_model = model.into();
        self
    }

    /// Set the max completion tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the generation temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry budget.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}
