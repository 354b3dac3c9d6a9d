//! The turn state machine.
//!
//! One call to [`Orchestrator::run_turn`] drives a full turn:
//! `Start → Extract → Plan → Route → {Clarify | Execute} → Finalize`.
//! No stage is revisited; every stage appends to the trace. The turn
//! holds its thread's history lock for the whole run, so overlapping
//! turns on one thread serialize instead of racing on history.

use std::sync::Arc;

use pipeline_core::{
    hash_prompt, last_user_content, Attachment, ChatMessage, ContentExtractor, TextService,
    ThreadStore,
};
use tracing::{debug, error, info};

use crate::error::TurnError;
use crate::extract;
use crate::planner;
use crate::router::{route, Route};
use crate::state::{Stage, TurnOutcome, TurnState};
use crate::tasks;

/// Sequences the pipeline stages for every turn and owns the thread
/// store that gives turns memory.
pub struct Orchestrator {
    service: Arc<dyn TextService>,
    extractor: Arc<dyn ContentExtractor>,
    threads: ThreadStore,
    planner_prompt: String,
}

impl Orchestrator {
    pub fn new(
        service: Arc<dyn TextService>,
        extractor: Arc<dyn ContentExtractor>,
        threads: ThreadStore,
    ) -> Self {
        let planner_prompt = planner::load_planner_prompt();
        info!(prompt_hash = %hash_prompt(&planner_prompt), "planner prompt ready");
        Self {
            service,
            extractor,
            threads,
            planner_prompt,
        }
    }

    /// The thread store, for maintenance endpoints.
    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    /// Run one turn against a thread.
    ///
    /// On success the exchange is appended to the thread's history. On
    /// error the history is left untouched, so the caller can retry the
    /// turn without duplicating messages.
    pub async fn run_turn(
        &self,
        thread_id: &str,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<TurnOutcome, TurnError> {
        let slot = self.threads.slot(thread_id).await;
        // Held for the whole turn: same-thread turns serialize here.
        let mut history = slot.lock().await;

        // What this turn's user side looks like in history. Uploads
        // without text leave a marker so later turns have context.
        let user_record = match (&text, &attachment) {
            (Some(t), _) if !t.trim().is_empty() => t.clone(),
            (_, Some(a)) => format!("[uploaded {}]", a.filename),
            _ => String::new(),
        };

        let mut state = TurnState::new(history.clone(), text, attachment);
        state.trace(
            Stage::Start,
            format!(
                "thread={} history_messages={}",
                thread_id,
                history.len()
            ),
        );
        info!(thread_id, history_messages = history.len(), "turn started");

        extract::run(&mut state, self.extractor.as_ref()).await;

        let user_message = last_user_content(&state.messages).to_string();
        let plan = match planner::plan(
            self.service.as_ref(),
            &self.planner_prompt,
            &user_message,
            &state.extracted_text,
        )
        .await
        {
            Ok(plan) => plan,
            Err(e) => {
                state.trace(Stage::Plan, format!("classification failed: {}", e));
                error!(thread_id, error = %e, trace = ?state.trace, "turn failed in planning");
                return Err(e.into());
            }
        };
        state.trace(
            Stage::Plan,
            format!(
                "task={} needs_clarification={}",
                plan.task.as_str(),
                plan.needs_clarification
            ),
        );
        if !plan.reasoning.is_empty() {
            debug!(thread_id, reasoning = %plan.reasoning, "planner reasoning");
        }

        let branch = route(plan.task, plan.needs_clarification);
        state.trace(Stage::Route, format!("-> {}", branch.as_str()));

        let result = match branch {
            Route::Clarification => {
                state.trace(Stage::Clarify, "asking the user to clarify");
                plan.clarification_question.clone()
            }
            Route::TranscriptOnly => {
                state.trace(Stage::Execute, "transcript passthrough, no model call");
                tasks::transcript_only(&state.extracted_text)
            }
            _ => {
                let executed = match branch {
                    Route::Summary => {
                        tasks::summary(self.service.as_ref(), &state.extracted_text).await
                    }
                    Route::Sentiment => {
                        tasks::sentiment(self.service.as_ref(), &state.extracted_text).await
                    }
                    Route::CodeExplainer => {
                        tasks::code_explanation(self.service.as_ref(), &state.extracted_text)
                            .await
                    }
                    Route::Qa => {
                        tasks::qa(
                            self.service.as_ref(),
                            &state.extracted_text,
                            &user_message,
                        )
                        .await
                    }
                    Route::Conversation => {
                        tasks::conversation(self.service.as_ref(), &state.messages).await
                    }
                    Route::Clarification | Route::TranscriptOnly => {
                        unreachable!("handled above")
                    }
                };
                match executed {
                    Ok(result) => {
                        state.trace(
                            Stage::Execute,
                            format!("{} produced {} chars", branch.as_str(), result.len()),
                        );
                        result
                    }
                    Err(e) => {
                        state.trace(Stage::Execute, format!("{} failed: {}", branch.as_str(), e));
                        error!(thread_id, branch = branch.as_str(), error = %e, trace = ?state.trace, "turn failed in execution");
                        return Err(e.into());
                    }
                }
            }
        };

        state.messages.push(ChatMessage::assistant(result.clone()));
        state.final_result = Some(result.clone());
        state.trace(Stage::Finalize, format!("result {} chars", result.len()));

        self.threads.record_exchange(&mut history, &user_record, &result);
        drop(history);

        info!(thread_id, task = plan.task.as_str(), "turn finished");
        state.plan = Some(plan.clone());

        Ok(TurnOutcome {
            extracted_text: state.extracted_text,
            plan,
            result,
            trace: state.trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_core::{
        ExtractError, Extraction, ServiceError, SourceKind, Task, GENERIC_CLARIFICATION,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockService {
        structured: Option<Value>,
        structured_error: Option<ServiceError>,
        completion: String,
        fail_completion: bool,
        complete_calls: AtomicUsize,
        last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl MockService {
        fn planning(task: &str, needs_clarification: bool, question: &str) -> Self {
            Self {
                structured: Some(json!({
                    "task": task,
                    "needs_clarification": needs_clarification,
                    "clarification_question": question,
                    "reasoning": "test reasoning"
                })),
                structured_error: None,
                completion: "model output".to_string(),
                fail_completion: false,
                complete_calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextService for MockService {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            if self.fail_completion {
                return Err(ServiceError::Timeout);
            }
            Ok(self.completion.clone())
        }

        async fn complete_structured(&self, _prompt: &str) -> Result<Value, ServiceError> {
            if let Some(e) = &self.structured_error {
                return Err(match e {
                    ServiceError::Malformed(m) => ServiceError::Malformed(m.clone()),
                    _ => ServiceError::Timeout,
                });
            }
            match &self.structured {
                Some(v) => Ok(v.clone()),
                None => Err(ServiceError::EmptyResponse),
            }
        }
    }

    struct MockExtractor {
        image_text: String,
    }

    #[async_trait]
    impl ContentExtractor for MockExtractor {
        async fn image(&self, _data: &[u8]) -> Result<Extraction, ExtractError> {
            Ok(Extraction::with_confidence(
                self.image_text.clone(),
                SourceKind::Image,
                1.0,
            ))
        }

        async fn pdf(&self, _data: &[u8]) -> Result<Extraction, ExtractError> {
            Ok(Extraction::with_confidence(
                "pdf ocr text",
                SourceKind::Pdf,
                0.5,
            ))
        }

        async fn audio(&self, _data: &[u8], _filename: &str) -> Result<Extraction, ExtractError> {
            Ok(Extraction::text_only("spoken words", SourceKind::Audio))
        }
    }

    fn orchestrator(service: MockService) -> Orchestrator {
        Orchestrator::new(
            Arc::new(service),
            Arc::new(MockExtractor {
                image_text: "image text".to_string(),
            }),
            ThreadStore::new(20),
        )
    }

    #[tokio::test]
    async fn test_summary_turn_without_attachment() {
        let mut service = MockService::planning("summary", false, "");
        service.completion =
            "One line.\n- a\n- b\n- c\nFive sentences of detail follow here.".to_string();
        let orch = orchestrator(service);

        let outcome = orch
            .run_turn("t1", Some("Summarize this".to_string()), None)
            .await
            .unwrap();

        assert_eq!(outcome.plan.task, Task::Summary);
        assert!(!outcome.plan.needs_clarification);
        assert_eq!(outcome.extracted_text, "Summarize this");
        assert!(outcome.result.contains("One line."));
        assert!(outcome.result.contains("- c"));
    }

    #[tokio::test]
    async fn test_ambiguous_upload_asks_for_clarification() {
        let service = Arc::new(MockService::planning(
            "none",
            true,
            "What would you like me to do with this image?",
        ));
        let orch = Orchestrator::new(
            service.clone(),
            Arc::new(MockExtractor {
                image_text: "image text".to_string(),
            }),
            ThreadStore::new(20),
        );
        let attachment = Attachment::new(vec![0x89, 0x50], "photo.png", "image/png");

        let outcome = orch.run_turn("t1", None, Some(attachment)).await.unwrap();

        assert_eq!(outcome.extracted_text, "image text");
        assert!(outcome.plan.needs_clarification);
        assert_eq!(
            outcome.result,
            "What would you like me to do with this image?"
        );
        // The only model call was the planner's structured one.
        assert_eq!(service.complete_calls.load(Ordering::SeqCst), 0);
        assert!(outcome
            .trace
            .iter()
            .any(|line| line.starts_with("[clarify]")));
        assert!(!outcome.trace.iter().any(|line| line.starts_with("[execute]")));
    }

    #[tokio::test]
    async fn test_no_executor_runs_on_clarification() {
        let service = MockService::planning("summary", true, "Which part should I summarize?");
        let orch = Orchestrator::new(
            Arc::new(service),
            Arc::new(MockExtractor {
                image_text: String::new(),
            }),
            ThreadStore::new(20),
        );

        let outcome = orch
            .run_turn("t1", Some("this".to_string()), None)
            .await
            .unwrap();
        assert_eq!(outcome.result, "Which part should I summarize?");
    }

    #[tokio::test]
    async fn test_malformed_planner_response_degrades() {
        let mut service = MockService::planning("summary", false, "");
        service.structured = None;
        service.structured_error = Some(ServiceError::Malformed("not json".to_string()));
        let orch = orchestrator(service);

        let outcome = orch
            .run_turn("t1", Some("do something".to_string()), None)
            .await
            .unwrap();

        assert_eq!(outcome.plan.task, Task::None);
        assert!(outcome.plan.needs_clarification);
        assert_eq!(outcome.result, GENERIC_CLARIFICATION);
    }

    #[tokio::test]
    async fn test_transcript_only_is_verbatim_and_model_free() {
        let service = MockService::planning("transcript_only", false, "");
        let orch = Orchestrator::new(
            Arc::new(service),
            Arc::new(MockExtractor {
                image_text: "exact transcript text".to_string(),
            }),
            ThreadStore::new(20),
        );
        let attachment = Attachment::new(vec![1], "shot.png", "image/png");

        let outcome = orch
            .run_turn("t1", Some("just the text please".to_string()), Some(attachment))
            .await
            .unwrap();

        assert_eq!(outcome.result, "exact transcript text");
        assert!(outcome
            .trace
            .iter()
            .any(|line| line.contains("no model call")));
    }

    #[tokio::test]
    async fn test_code_explanation_turn() {
        let mut service = MockService::planning("code_explanation", false, "");
        service.completion =
            "This function sorts the input. Risk: no bounds check. O(n log n) time, O(n) space."
                .to_string();
        let orch = orchestrator(service);

        let outcome = orch
            .run_turn(
                "t1",
                Some("What does this code do? fn f() {}".to_string()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.plan.task, Task::CodeExplanation);
        assert!(outcome.result.contains("Risk"));
        assert!(outcome.result.contains("O(n log n)"));
    }

    #[tokio::test]
    async fn test_final_result_always_set_exactly_once() {
        for (task, needs) in [
            ("summary", false),
            ("qa", false),
            ("none", false),
            ("none", true),
            ("transcript_only", false),
        ] {
            let service = MockService::planning(task, needs, "a question?");
            let orch = orchestrator(service);
            let outcome = orch
                .run_turn("t1", Some("hello".to_string()), None)
                .await
                .unwrap();
            let finalize_entries = outcome
                .trace
                .iter()
                .filter(|line| line.starts_with("[finalize]"))
                .count();
            assert_eq!(finalize_entries, 1, "task={} needs={}", task, needs);
            assert!(!outcome.result.is_empty() || task == "transcript_only");
        }
    }

    #[tokio::test]
    async fn test_history_grows_across_turns() {
        let service = MockService::planning("conversation", false, "");
        let orch = orchestrator(service);

        orch.run_turn("t1", Some("first".to_string()), None)
            .await
            .unwrap();
        orch.run_turn("t1", Some("second".to_string()), None)
            .await
            .unwrap();

        let slot = orch.threads().slot("t1").await;
        let history = slot.lock().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[2].content, "second");
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_untouched() {
        let mut service = MockService::planning("summary", false, "");
        service.fail_completion = true;
        let orch = orchestrator(service);

        let result = orch.run_turn("t1", Some("summarize".to_string()), None).await;
        assert!(matches!(result, Err(TurnError::Service(_))));

        let slot = orch.threads().slot("t1").await;
        let history = slot.lock().await;
        assert!(history.is_empty(), "failed turn must not record history");
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let service = MockService::planning("conversation", false, "");
        let orch = orchestrator(service);

        orch.run_turn("a", Some("only in a".to_string()), None)
            .await
            .unwrap();

        let slot = orch.threads().slot("b").await;
        let history = slot.lock().await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_text_leaves_history_marker() {
        let service = MockService::planning("summary", false, "");
        let orch = orchestrator(service);
        let attachment = Attachment::new(vec![1], "notes.png", "image/png");

        orch.run_turn("t1", None, Some(attachment)).await.unwrap();

        let slot = orch.threads().slot("t1").await;
        let history = slot.lock().await;
        assert_eq!(history[0].content, "[uploaded notes.png]");
    }
}
