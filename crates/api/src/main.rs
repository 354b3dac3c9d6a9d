//! HTTP boundary: one multipart endpoint that runs a pipeline turn.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use extractors::{MediaExtractor, PdfiumBackend};
use openai_client::{OpenAiClient, OpenAiConfig};
use orchestrator::{Orchestrator, TurnError, TurnOutcome};
use pipeline_core::{Attachment, Plan, ThreadStore};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

/// Uploads larger than this are rejected at the HTTP layer.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const DEFAULT_HISTORY_TURNS: usize = 20;

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    thread_id: String,
    extracted_text: String,
    plan: Plan,
    result: String,
    trace: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
    threads: usize,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match OpenAiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let client = match OpenAiClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("client setup failed: {}", e);
            std::process::exit(1);
        }
    };
    let client = Arc::new(client);

    let extractor = Arc::new(MediaExtractor::new(
        client.clone(),
        Arc::new(PdfiumBackend::new()),
    ));

    let max_turns = env::var("HISTORY_MAX_TURNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_HISTORY_TURNS);
    let threads = ThreadStore::new(max_turns);

    let state = AppState {
        orchestrator: Arc::new(Orchestrator::new(client, extractor, threads)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    let addr = env::var("PIPELINE_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid PIPELINE_API_ADDR {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!(%addr, "pipeline api listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("bind failed on {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("server error: {}", e);
        std::process::exit(1);
    }
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        threads: state.orchestrator.threads().thread_count().await,
    })
}

/// One pipeline turn: multipart fields `text` (optional), `thread_id`
/// (optional, generated when absent), and `file` (optional upload).
async fn chat(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut text: Option<String> = None;
    let mut thread_id: Option<String> = None;
    let mut attachment: Option<Attachment> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("malformed multipart body: {}", e)),
        };

        match field.name().unwrap_or_default() {
            "text" => match field.text().await {
                Ok(value) => text = Some(value),
                Err(e) => return bad_request(format!("unreadable text field: {}", e)),
            },
            "thread_id" => match field.text().await {
                Ok(value) if !value.trim().is_empty() => thread_id = Some(value),
                Ok(_) => {}
                Err(e) => return bad_request(format!("unreadable thread_id field: {}", e)),
            },
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => {
                        attachment = Some(Attachment::new(data.to_vec(), filename, content_type));
                    }
                    Err(e) => return bad_request(format!("unreadable file field: {}", e)),
                }
            }
            other => {
                return bad_request(format!("unexpected multipart field: {}", other));
            }
        }
    }

    if text.is_none() && attachment.is_none() {
        return bad_request("provide a text field, a file field, or both".to_string());
    }

    let thread_id = thread_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    match state
        .orchestrator
        .run_turn(&thread_id, text, attachment)
        .await
    {
        Ok(outcome) => turn_response(thread_id, outcome),
        Err(e @ TurnError::Service(_)) => {
            error!(%thread_id, error = %e, "turn failed");
            let body = ErrorBody {
                error: e.to_string(),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

fn turn_response(thread_id: String, outcome: TurnOutcome) -> Response {
    Json(ChatResponse {
        thread_id,
        extracted_text: outcome.extracted_text,
        plan: outcome.plan,
        result: outcome.result,
        trace: outcome.trace,
    })
    .into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}
