//! Test utilities for finsight-core
//!
//! This module provides a mock text-generation server speaking the Ollama,
//! OpenAI chat completions and Gemini `generateContent` APIs, for backend and
//! integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::heuristic_reply;

/// How the generate endpoints answer
#[derive(Clone, Copy, Default, PartialEq, Eq)]
enum ReplyMode {
    #[default]
    Heuristic,
    /// 500 Internal Server Error
    Failing,
    /// Success status with no usable text
    Empty,
}

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<Value>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
    mode: ReplyMode,
}

impl ServerState {
    fn record(&self, body: &Value) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(body.clone());
    }

    fn record_api_key(&self, headers: &HeaderMap) {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.api_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key);
    }

    /// Reply text for a prompt; `None` means answer with a 500
    fn reply(&self, prompt: &str) -> Option<String> {
        match self.mode {
            ReplyMode::Heuristic => Some(heuristic_reply(prompt)),
            ReplyMode::Failing => None,
            ReplyMode::Empty => Some(String::new()),
        }
    }
}

/// Mock text-generation server for testing and development
pub struct MockGenerateServer {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGenerateServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::spawn(ServerState::default()).await
    }

    /// Start a server whose generate endpoints always answer 500
    pub async fn start_failing() -> Self {
        Self::spawn(ServerState {
            mode: ReplyMode::Failing,
            ..Default::default()
        })
        .await
    }

    /// Start a server whose generate endpoints succeed without any text
    /// (Gemini answers with no candidates)
    pub async fn start_empty() -> Self {
        Self::spawn(ServerState {
            mode: ReplyMode::Empty,
            ..Default::default()
        })
        .await
    }

    async fn spawn(state: ServerState) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .route(
                "/v1beta/models/:model",
                get(handle_gemini_model).post(handle_gemini_generate),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// JSON bodies received by the generate endpoints, in order
    pub fn requests(&self) -> Vec<Value> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// `x-goog-api-key` header of each Gemini generate call, in order
    pub fn api_keys(&self) -> Vec<String> {
        self.state
            .api_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGenerateServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": "llama3.2:latest",
            "modified_at": "2024-01-01T00:00:00Z",
            "size": 4_000_000_000u64
        }]
    }))
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{"id": "llama3.2", "object": "model", "owned_by": "mock"}]
    }))
}

fn service_unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "model not loaded"})),
    )
        .into_response()
}

/// Ollama generate endpoint
async fn handle_ollama_generate(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Response {
    state.record(&body);

    let prompt = body["prompt"].as_str().unwrap_or_default();
    match state.reply(prompt) {
        Some(text) => Json(json!({
            "model": body["model"],
            "response": text,
            "done": true
        }))
        .into_response(),
        None => service_unavailable(),
    }
}

/// OpenAI chat completions endpoint
async fn handle_chat_completions(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Response {
    state.record(&body);

    // The last user message carries the prompt
    let prompt = body["messages"]
        .as_array()
        .and_then(|messages| {
            messages
                .iter()
                .rev()
                .find(|m| m["role"] == "user")
                .and_then(|m| m["content"].as_str())
        })
        .unwrap_or_default();

    match state.reply(prompt) {
        Some(text) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": body["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        None => service_unavailable(),
    }
}

/// Gemini model lookup (health check)
async fn handle_gemini_model(Path(model): Path<String>, headers: HeaderMap) -> Response {
    if !headers.contains_key("x-goog-api-key") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "API key missing"}})),
        )
            .into_response();
    }
    Json(json!({"name": format!("models/{}", model)})).into_response()
}

/// Gemini generateContent endpoint (`/v1beta/models/{model}:generateContent`)
async fn handle_gemini_generate(
    State(state): State<ServerState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let Some(model) = call.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "unknown method"}))).into_response();
    };
    state.record_api_key(&headers);
    body["model"] = json!(model);
    state.record(&body);

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    match state.reply(prompt) {
        Some(text) if text.is_empty() => Json(json!({"candidates": []})).into_response(),
        Some(text) => Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        None => service_unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_ollama_generate() {
        let server = MockGenerateServer::start().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/generate", server.url()))
            .json(&json!({
                "model": "llama3.2",
                "prompt": "Note: Uber to airport\nOutput format: Category | Type",
                "stream": false
            }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["response"], "Transportation | Expense");
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_server_gemini_generate() {
        let server = MockGenerateServer::start().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!(
                "{}/v1beta/models/gemini-2.5-flash:generateContent",
                server.url()
            ))
            .header("x-goog-api-key", "test-key")
            .json(&json!({
                "contents": [{"role": "user", "parts": [{"text": "Note: Netflix\nOutput format: Category | Type"}]}]
            }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body["candidates"][0]["content"]["parts"][0]["text"],
            "Entertainment | Expense"
        );
        assert_eq!(server.requests()[0]["model"], "gemini-2.5-flash");
        assert_eq!(server.api_keys(), vec!["test-key".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_server_failing() {
        let server = MockGenerateServer::start_failing().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/v1/chat/completions", server.url()))
            .json(&json!({"model": "x", "messages": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        // Health checks still pass
        let resp = client
            .get(format!("{}/api/tags", server.url()))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }
}
