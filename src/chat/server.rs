//! Axum HTTP server for the chat endpoint
//!
//! Routes:
//! - `POST /chat` accepts `{"message": "..."}` and returns `{"reply": "..."}`
//! - `GET /health` returns a liveness document
//!
//! Each request builds a system prompt from the base navigation prompt
//! plus a digest of the most recent saved runs, so the assistant can
//! quote current announcements and events.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::chat::provider::ChatProvider;
use crate::chat::NAVIGATION_SYSTEM_PROMPT;
use crate::error::Result;
use crate::storage::RunStore;

/// Maximum characters of extracted content folded into the prompt per
/// record. Keeps prompts bounded on content-heavy pages.
const CONTEXT_SNIPPET_CHARS: usize = 600;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ChatProvider>,
    store: Arc<RunStore>,
}

impl AppState {
    /// Bundle a provider and run store for the router.
    pub fn new(provider: Arc<dyn ChatProvider>, store: Arc<RunStore>) -> Self {
        Self { provider, store }
    }

    /// Base prompt plus a digest of the latest saved runs. Storage
    /// errors degrade to the base prompt rather than failing the
    /// request.
    fn system_prompt(&self) -> String {
        let mut prompt = NAVIGATION_SYSTEM_PROMPT.to_string();
        let runs = match self.store.list() {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!("Could not load run context for chat: {:#}", e);
                return prompt;
            }
        };
        // Latest complete run per source only.
        let mut seen_sources = std::collections::HashSet::new();
        for run in runs.iter().filter(|r| !r.partial) {
            if !seen_sources.insert(run.source.clone()) {
                continue;
            }
            prompt.push_str(&format!("\n\nRecent {} (fetched {}):", run.source, run.started_at));
            for record in run.records.iter().filter(|r| !r.is_error()) {
                let snippet: String = record.content.chars().take(CONTEXT_SNIPPET_CHARS).collect();
                prompt.push_str(&format!("\n- {}: {}", record.title, snippet));
            }
        }
        prompt
    }
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    /// The user's question
    pub message: String,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatReplyBody {
    /// The assistant's answer
    pub reply: String,
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Build the router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server loop
/// fails.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Chat endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(body): Json<ChatRequestBody>,
) -> std::result::Result<Json<ChatReplyBody>, (StatusCode, Json<serde_json::Value>)> {
    if body.message.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "message must not be empty",
        ));
    }

    let system = state.system_prompt();
    match state.provider.reply(&system, &body.message).await {
        Ok(reply) => Ok(Json(ChatReplyBody { reply })),
        Err(e) => {
            tracing::error!("Chat provider failed: {:#}", e);
            Err(error_response(
                StatusCode::BAD_GATEWAY,
                &format!("{:#}", e),
            ))
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn error_response(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message })))
}
