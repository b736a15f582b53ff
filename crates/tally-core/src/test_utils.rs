//! Test utilities for tally-core
//!
//! Provides a mock Gemini server speaking just enough of the Generative
//! Language REST API for `GeminiBackend` to be exercised end to end.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::DEFAULT_MOCK_RESPONSE;

/// Scripted behaviour for one generateContent request
#[derive(Debug, Clone)]
pub enum MockGeminiReply {
    /// 200 with one candidate carrying this text
    Text(String),
    /// Non-success status with this body
    Status(u16, String),
    /// 200 with `promptFeedback.blockReason` set
    Blocked(String),
    /// 200 with an empty candidate list
    NoCandidates,
    /// Wait, then answer with this text
    Delayed(Duration, String),
}

impl MockGeminiReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockGeminiReply::Text(text.into())
    }
}

/// A request the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub api_key: Option<String>,
    pub prompt: String,
}

#[derive(Default)]
struct ServerState {
    replies: Mutex<VecDeque<MockGeminiReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Gemini server for testing and development
///
/// Replies are consumed in order; once exhausted the server answers with
/// [`DEFAULT_MOCK_RESPONSE`].
pub struct MockGeminiServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start(replies: Vec<MockGeminiReply>) -> Self {
        let state = Arc::new(ServerState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/v1beta/models/:action",
                get(handle_model_info).post(handle_generate),
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

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// API keys sent with each request (empty string when missing)
    pub fn api_keys(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.api_key.unwrap_or_default())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model metadata endpoint (health check)
async fn handle_model_info(Path(model): Path<String>) -> Json<Value> {
    Json(json!({
        "name": format!("models/{}", model),
        "displayName": model,
    }))
}

/// generateContent endpoint; the path segment is `{model}:generateContent`
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(model) = action.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, "unknown action").into_response();
    };

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        model: model.to_string(),
        api_key,
        prompt,
    });

    let reply = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| MockGeminiReply::text(DEFAULT_MOCK_RESPONSE));

    match reply {
        MockGeminiReply::Text(text) => Json(candidate(&text)).into_response(),
        MockGeminiReply::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        MockGeminiReply::Blocked(reason) => {
            Json(json!({ "promptFeedback": { "blockReason": reason } })).into_response()
        }
        MockGeminiReply::NoCandidates => Json(json!({ "candidates": [] })).into_response(),
        MockGeminiReply::Delayed(delay, text) => {
            tokio::time::sleep(delay).await;
            Json(candidate(&text)).into_response()
        }
    }
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
