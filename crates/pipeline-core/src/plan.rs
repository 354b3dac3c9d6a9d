//! The fixed task taxonomy and the planner's output shape.

use serde::{Deserialize, Deserializer, Serialize};

/// Fallback question used whenever the planner asks for clarification
/// without providing one (or its response could not be decoded).
pub const GENERIC_CLARIFICATION: &str =
    "Could you clarify what you want me to do with this content?";

/// The fixed set of analysis tasks the pipeline can run.
///
/// Exactly one task is chosen per turn. Unknown labels from the
/// classification step decode to [`Task::None`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Summary,
    Sentiment,
    CodeExplanation,
    Qa,
    Conversation,
    TranscriptOnly,
    #[default]
    None,
}

impl Task {
    /// Wire label for this task.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summary => "summary",
            Task::Sentiment => "sentiment",
            Task::CodeExplanation => "code_explanation",
            Task::Qa => "qa",
            Task::Conversation => "conversation",
            Task::TranscriptOnly => "transcript_only",
            Task::None => "none",
        }
    }

    /// Decode a wire label; anything unrecognized maps to [`Task::None`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "summary" => Task::Summary,
            "sentiment" => Task::Sentiment,
            "code_explanation" => Task::CodeExplanation,
            "qa" => Task::Qa,
            "conversation" => Task::Conversation,
            "transcript_only" => Task::TranscriptOnly,
            _ => Task::None,
        }
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Task::from_label(&label))
    }
}

/// The planner's decision for one turn.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Plan {
    /// Chosen task (tentative when clarification is needed).
    #[serde(default)]
    pub task: Task,
    /// Whether the turn must stop and ask the user what they want.
    #[serde(default)]
    pub needs_clarification: bool,
    /// Short question for the user; non-empty iff `needs_clarification`.
    #[serde(default)]
    pub clarification_question: String,
    /// One-sentence rationale from the classifier. Kept for the trace,
    /// not exposed in the external response.
    #[serde(default, skip_serializing)]
    pub reasoning: String,
}

impl Plan {
    /// Safe fallback when the classification response cannot be decoded.
    pub fn parse_fallback(reason: impl Into<String>) -> Self {
        Self {
            task: Task::None,
            needs_clarification: true,
            clarification_question: GENERIC_CLARIFICATION.to_string(),
            reasoning: reason.into(),
        }
    }

    /// Enforce the output-shape invariant regardless of what the
    /// classifier produced:
    ///
    /// - `needs_clarification == true` requires a non-empty question
    ///   (the generic one is substituted if missing);
    /// - `needs_clarification == false` requires no question at all.
    pub fn normalize(mut self) -> Self {
        if self.needs_clarification {
            if self.clarification_question.trim().is_empty() {
                self.clarification_question = GENERIC_CLARIFICATION.to_string();
            }
        } else {
            self.clarification_question.clear();
        }
        self
    }

    /// The clarification question, if the invariant says one exists.
    pub fn question(&self) -> Option<&str> {
        if self.clarification_question.is_empty() {
            None
        } else {
            Some(self.clarification_question.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_wire_labels() {
        assert_eq!(
            serde_json::to_string(&Task::CodeExplanation).unwrap(),
            "\"code_explanation\""
        );
        assert_eq!(
            serde_json::to_string(&Task::TranscriptOnly).unwrap(),
            "\"transcript_only\""
        );
        let t: Task = serde_json::from_str("\"qa\"").unwrap();
        assert_eq!(t, Task::Qa);
    }

    #[test]
    fn test_unknown_task_label_decodes_to_none() {
        let t: Task = serde_json::from_str("\"translate\"").unwrap();
        assert_eq!(t, Task::None);
    }

    #[test]
    fn test_normalize_substitutes_generic_question() {
        let plan = Plan {
            task: Task::None,
            needs_clarification: true,
            ..Default::default()
        }
        .normalize();
        assert_eq!(plan.question(), Some(GENERIC_CLARIFICATION));

        let plan = Plan {
            needs_clarification: true,
            clarification_question: "   ".to_string(),
            ..Default::default()
        }
        .normalize();
        assert_eq!(plan.question(), Some(GENERIC_CLARIFICATION));
    }

    #[test]
    fn test_normalize_clears_question_when_not_needed() {
        let plan = Plan {
            task: Task::Summary,
            needs_clarification: false,
            clarification_question: "Which part?".to_string(),
            ..Default::default()
        }
        .normalize();
        assert!(plan.question().is_none());
        assert!(plan.clarification_question.is_empty());
    }

    #[test]
    fn test_parse_fallback_shape() {
        let plan = Plan::parse_fallback("failed to decode classifier JSON");
        assert_eq!(plan.task, Task::None);
        assert!(plan.needs_clarification);
        assert_eq!(plan.question(), Some(GENERIC_CLARIFICATION));
        assert!(plan.reasoning.contains("decode"));
    }

    #[test]
    fn test_plan_decodes_with_missing_fields() {
        let plan: Plan = serde_json::from_str(r#"{"task": "summary"}"#).unwrap();
        assert_eq!(plan.task, Task::Summary);
        assert!(!plan.needs_clarification);
        assert!(plan.clarification_question.is_empty());
    }

    #[test]
    fn test_reasoning_not_serialized() {
        let plan = Plan {
            task: Task::Qa,
            needs_clarification: false,
            clarification_question: String::new(),
            reasoning: "user asked a direct question".to_string(),
        };
        let json = serde_json::to_string(&plan).unwrap();
        assert!(!json.contains("reasoning"));
    }
}
