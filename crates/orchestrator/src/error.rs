//! Error types for turn orchestration.

use pipeline_core::ServiceError;
use thiserror::Error;

/// Errors that end a turn.
///
/// Most failure modes inside a turn degrade instead of erroring:
/// extractor failures fall back to the raw message text, and planner
/// parse failures fall back to a clarification plan. What remains here
/// is genuinely fatal — without the language model no executor can run.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The language model service failed.
    #[error("language model call failed: {0}")]
    Service(#[from] ServiceError),
}
