//! OpenAI-backed implementation of the pipeline's service traits.
//!
//! [`OpenAiClient`] implements [`pipeline_core::TextService`] over the
//! chat completions API and additionally exposes vision OCR and Whisper
//! transcription for the extractor crate.

mod api_types;
mod client;
mod config;

pub use api_types::{
    ApiErrorBody, ApiMessage, ChatCompletionRequest, ChatCompletionResponse, ContentPart,
    MessageContent,
};
pub use client::OpenAiClient;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};
