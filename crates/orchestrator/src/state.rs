//! Per-turn mutable state and the finished-turn outcome.

use pipeline_core::{Attachment, ChatMessage, Plan};
use serde::Serialize;

/// Stages of a turn, in the order they run.
///
/// The sequence is fixed and acyclic: `Start → Extract → Plan → Route →
/// {Clarify | Execute} → Finalize`. No stage is revisited within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extract,
    Plan,
    Route,
    Clarify,
    Execute,
    Finalize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Extract => "extract",
            Stage::Plan => "plan",
            Stage::Route => "route",
            Stage::Clarify => "clarify",
            Stage::Execute => "execute",
            Stage::Finalize => "finalize",
        }
    }
}

/// Mutable state for one turn.
///
/// Owned exclusively by the orchestrator while the turn runs; folded
/// into the thread history and the [`TurnOutcome`] at finalize.
#[derive(Debug, Default)]
pub struct TurnState {
    /// Prior history plus this turn's user message, append-only.
    pub messages: Vec<ChatMessage>,
    /// This turn's upload, if any. Taken (cleared) by the extraction
    /// dispatcher so it can never be processed twice.
    pub attachment: Option<Attachment>,
    /// Extracted content, set exactly once by the extraction stage.
    pub extracted_text: String,
    /// Planner output, set once planning completes.
    pub plan: Option<Plan>,
    /// The single user-visible result, set by exactly one of the
    /// clarification branch or a task executor.
    pub final_result: Option<String>,
    /// Human-readable log of what each stage did.
    pub trace: Vec<String>,
}

impl TurnState {
    /// Start a turn from prior history, this turn's optional user text,
    /// and this turn's optional upload.
    ///
    /// A user message is appended even when no text was supplied
    /// (attachment-only turns), so "most recent user message" always
    /// refers to this turn and never to a previous one.
    pub fn new(
        history: Vec<ChatMessage>,
        user_text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Self {
        let mut messages = history;
        messages.push(ChatMessage::user(user_text.unwrap_or_default()));
        Self {
            messages,
            attachment,
            ..Self::default()
        }
    }

    /// Append a stage-tagged trace entry.
    pub fn trace(&mut self, stage: Stage, entry: impl AsRef<str>) {
        self.trace.push(format!("[{}] {}", stage.as_str(), entry.as_ref()));
    }
}

/// What a finished turn hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub extracted_text: String,
    pub plan: Plan,
    pub result: String,
    pub trace: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::Role;

    #[test]
    fn test_new_appends_user_text_after_history() {
        let history = vec![
            ChatMessage::user("earlier"),
            ChatMessage::assistant("reply"),
        ];
        let state = TurnState::new(history, Some("now".to_string()), None);
        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[2].content, "now");
    }

    #[test]
    fn test_new_without_user_text_appends_empty_user_message() {
        let state = TurnState::new(vec![ChatMessage::assistant("reply")], None, None);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role, Role::User);
        assert_eq!(state.messages[1].content, "");
    }

    #[test]
    fn test_trace_entries_are_stage_tagged() {
        let mut state = TurnState::default();
        state.trace(Stage::Start, "turn started");
        state.trace(Stage::Extract, "no attachment");
        assert_eq!(state.trace[0], "[start] turn started");
        assert_eq!(state.trace[1], "[extract] no attachment");
    }
}
