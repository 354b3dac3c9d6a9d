//! Task executors, one per task label.
//!
//! Each LLM-backed executor is a single completion over a fixed prompt
//! template. Only the conversation executor sees history; the rest work
//! from the current turn's extracted text. `transcript_only` is a pure
//! passthrough with no model call at all.

use pipeline_core::{ChatMessage, ServiceError, TextService};

const SUMMARY_PROMPT: &str = "You are a summarization assistant. Summarize the provided content \
in three formats, in this order: a one-line summary, exactly three bullet points, and a detailed \
summary of five sentences.";

const SENTIMENT_PROMPT: &str = "You are a sentiment analyst. For the provided content, return a \
sentiment label (positive, negative, or neutral), a confidence from 0 to 100, and a one-line \
justification.";

const CODE_PROMPT: &str = "You are a code reviewer. For the provided code, explain what it does, \
call out potential bugs or risks, and state its time and space complexity in Big-O notation.";

const QA_PROMPT: &str = "You are a question-answering assistant. Answer the user's question using \
ONLY the provided context. If the answer cannot be derived from the context, say so explicitly \
instead of guessing.";

const CONVERSATION_PROMPT: &str =
    "You are a helpful assistant. Continue the conversation naturally.";

async fn complete_over(
    service: &dyn TextService,
    system: &str,
    user: String,
) -> Result<String, ServiceError> {
    let messages = [ChatMessage::system(system), ChatMessage::user(user)];
    service.complete(&messages).await
}

/// One-line summary, three bullets, and a five-sentence detail pass.
pub async fn summary(service: &dyn TextService, text: &str) -> Result<String, ServiceError> {
    complete_over(service, SUMMARY_PROMPT, format!("Content:\n{}", text)).await
}

/// Sentiment label, 0-100 confidence, one-line justification.
pub async fn sentiment(service: &dyn TextService, text: &str) -> Result<String, ServiceError> {
    complete_over(service, SENTIMENT_PROMPT, format!("Content:\n{}", text)).await
}

/// Behavior explanation, risk callouts, and complexity analysis.
pub async fn code_explanation(
    service: &dyn TextService,
    text: &str,
) -> Result<String, ServiceError> {
    complete_over(service, CODE_PROMPT, format!("Code:\n{}", text)).await
}

/// Answer `question` strictly from `text`.
pub async fn qa(
    service: &dyn TextService,
    text: &str,
    question: &str,
) -> Result<String, ServiceError> {
    complete_over(
        service,
        QA_PROMPT,
        format!("Context:\n{}\n\nQuestion:\n{}", text, question),
    )
    .await
}

/// Free-form chat over the full conversation history.
pub async fn conversation(
    service: &dyn TextService,
    history: &[ChatMessage],
) -> Result<String, ServiceError> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(CONVERSATION_PROMPT));
    messages.extend_from_slice(history);
    service.complete(&messages).await
}

/// Identity passthrough. No model call.
pub fn transcript_only(text: &str) -> String {
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_core::Role;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Echoes back the messages it was given, for prompt-shape checks.
    struct RecordingService {
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingService {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextService for RecordingService {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok("model output".to_string())
        }

        async fn complete_structured(&self, _prompt: &str) -> Result<Value, ServiceError> {
            Err(ServiceError::EmptyResponse)
        }
    }

    #[test]
    fn test_transcript_only_is_identity() {
        for input in ["", "plain", "multi\nline\ntext", "日本語"] {
            assert_eq!(transcript_only(input), input);
        }
    }

    #[tokio::test]
    async fn test_summary_sends_system_and_content() {
        let service = RecordingService::new();
        let out = summary(&service, "the document").await.unwrap();
        assert_eq!(out, "model output");

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, Role::System);
        assert!(seen[0].content.contains("three bullet points"));
        assert!(seen[1].content.contains("the document"));
    }

    #[tokio::test]
    async fn test_qa_includes_context_and_question() {
        let service = RecordingService::new();
        qa(&service, "the sky is blue", "what color is the sky?")
            .await
            .unwrap();

        let seen = service.seen.lock().unwrap();
        assert!(seen[1].content.contains("the sky is blue"));
        assert!(seen[1].content.contains("what color is the sky?"));
    }

    #[tokio::test]
    async fn test_conversation_carries_full_history() {
        let service = RecordingService::new();
        let history = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
            ChatMessage::user("how are you?"),
        ];
        conversation(&service, &history).await.unwrap();

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].role, Role::System);
        assert_eq!(seen[1].content, "hello");
        assert_eq!(seen[3].content, "how are you?");
    }
}
