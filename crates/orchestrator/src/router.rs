//! Task routing: planner output to the branch that runs.

use pipeline_core::Task;

/// The branch a turn executes after planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Clarification,
    Summary,
    Sentiment,
    CodeExplainer,
    Qa,
    Conversation,
    TranscriptOnly,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Clarification => "clarification",
            Route::Summary => "summary",
            Route::Sentiment => "sentiment",
            Route::CodeExplainer => "code_explainer",
            Route::Qa => "qa",
            Route::Conversation => "conversation",
            Route::TranscriptOnly => "transcript_only",
        }
    }
}

/// Map a plan to a branch. Total: every task value routes somewhere,
/// and `needs_clarification` wins over any task.
pub fn route(task: Task, needs_clarification: bool) -> Route {
    if needs_clarification {
        return Route::Clarification;
    }
    match task {
        Task::Summary => Route::Summary,
        Task::Sentiment => Route::Sentiment,
        Task::CodeExplanation => Route::CodeExplainer,
        Task::Qa => Route::Qa,
        Task::Conversation => Route::Conversation,
        Task::TranscriptOnly => Route::TranscriptOnly,
        // Safe default: unclassifiable turns become plain conversation.
        Task::None => Route::Conversation,
    }
}
