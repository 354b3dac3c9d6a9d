//! Intent planning: classify the turn into one task, or ask for
//! clarification.

use std::env;
use std::path::Path;

use pipeline_core::{hash_prompt, Plan, ServiceError, TextService};
use tracing::{debug, info, warn};

/// At most this many characters of extracted text go into the
/// classification prompt.
pub const PLANNER_EXTRACT_LIMIT: usize = 4000;

/// Default path for the planner prompt file.
pub const DEFAULT_PLANNER_PROMPT_FILE: &str = "PLANNER_PROMPT.md";

/// Embedded default classification prompt. The model must return one
/// JSON object matching the plan schema.
pub const DEFAULT_PLANNER_PROMPT: &str = r#"You are an intent classifier for a content-processing assistant.

Choose exactly one task for this turn from:
- "summary": the user wants the content summarized
- "sentiment": the user wants the tone or sentiment analyzed
- "code_explanation": the user wants code explained
- "qa": the user asks a direct question answerable from the content
- "conversation": general chat, no content analysis requested
- "transcript_only": the user only wants the raw extracted text back
- "none": no task fits

Rules:
- A direct, answerable question about the content is always "qa", never ambiguous.
- If the request is vague and could map to more than one task (for example a bare upload with no instruction), set "needs_clarification" to true and write a short clarification question (1-2 sentences).
- If "needs_clarification" is false, "clarification_question" must be an empty string.

Return ONLY a JSON object:
{"task": "...", "needs_clarification": true|false, "clarification_question": "...", "reasoning": "..."}"#;

/// Load the planner prompt.
///
/// Priority:
/// 1. `PLANNER_SYSTEM_PROMPT` env var (inline)
/// 2. Contents of prompt file (`PLANNER_PROMPT_FILE` or default
///    `PLANNER_PROMPT.md`)
/// 3. Embedded default
pub fn load_planner_prompt() -> String {
    if let Ok(prompt) = env::var("PLANNER_SYSTEM_PROMPT") {
        info!("Using planner prompt from PLANNER_SYSTEM_PROMPT env var");
        return prompt;
    }

    let prompt_file = env::var("PLANNER_PROMPT_FILE")
        .unwrap_or_else(|_| DEFAULT_PLANNER_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded planner prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default planner prompt");
    DEFAULT_PLANNER_PROMPT.to_string()
}

fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build the full classification prompt for one turn.
pub fn build_prompt(instructions: &str, user_message: &str, extracted_text: &str) -> String {
    format!(
        "{}\n\nUser message:\n{}\n\nExtracted content:\n{}",
        instructions,
        user_message,
        truncate_chars(extracted_text, PLANNER_EXTRACT_LIMIT)
    )
}

/// Clip a string to `limit` characters, respecting char boundaries.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Classify the turn.
///
/// Transport failures propagate; a response that cannot be decoded into
/// a plan degrades to [`Plan::parse_fallback`]. Either way the returned
/// plan is normalized, so the clarification-question invariant holds.
pub async fn plan(
    service: &dyn TextService,
    instructions: &str,
    user_message: &str,
    extracted_text: &str,
) -> Result<Plan, ServiceError> {
    let prompt = build_prompt(instructions, user_message, extracted_text);
    debug!(prompt_hash = %hash_prompt(&prompt), "classifying turn intent");

    let value = match service.complete_structured(&prompt).await {
        Ok(value) => value,
        Err(ServiceError::Malformed(reason)) => {
            warn!(%reason, "planner response not decodable; using fallback plan");
            return Ok(Plan::parse_fallback(reason).normalize());
        }
        Err(e) => return Err(e),
    };

    let plan = match serde_json::from_value::<Plan>(value) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(error = %e, "planner JSON did not match schema; using fallback plan");
            Plan::parse_fallback(format!("schema mismatch: {}", e))
        }
    };

    Ok(plan.normalize())
}
