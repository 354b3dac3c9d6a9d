//! Core types and traits for the content-analysis pipeline.
//!
//! This crate provides the shared vocabulary for the rest of the
//! workspace:
//!
//! - [`ChatMessage`] / [`Role`] - the single message shape used everywhere
//! - [`Task`] / [`Plan`] - the fixed task taxonomy and planner output
//! - [`Attachment`] / [`Extraction`] - uploaded files and extracted text
//! - [`TextService`] / [`ContentExtractor`] - traits at the external
//!   service boundaries (LLM completions, media extractors)
//! - [`ThreadStore`] - keyed conversation history with per-thread locking
//! - [`ServiceError`] / [`ExtractError`] - failures at those boundaries

mod error;
mod extraction;
mod history;
mod json;
mod message;
mod plan;
mod prompt;
mod service;

pub use error::{ExtractError, ServiceError};
pub use extraction::{Extraction, SourceKind};
pub use history::{ThreadSlot, ThreadStore};
pub use json::extract_json_object;
pub use message::{last_user_content, Attachment, ChatMessage, Role};
pub use plan::{Plan, Task, GENERIC_CLARIFICATION};
pub use prompt::hash_prompt;
pub use service::{ContentExtractor, TextService};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
