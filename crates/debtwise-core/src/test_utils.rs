//! Test utilities for debtwise-core
//!
//! Provides a mock OpenAI-compatible chat-completions server for exercising
//! the HTTP backend without a real completion service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// A chat-completions request as received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Fail(u16),
}

struct MockState {
    behavior: Behavior,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock OpenAI-compatible server for testing
pub struct MockChatServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state: Arc<MockState>,
}

impl MockChatServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::with_reply("Mock advice: pay down the highest-rate debt first.").await
    }

    /// Start a server that answers every completion with `reply`
    pub async fn with_reply(reply: &str) -> Self {
        Self::spawn(Behavior::Reply(reply.to_string())).await
    }

    /// Start a server that answers every completion with an HTTP error
    pub async fn failing(status: u16) -> Self {
        Self::spawn(Behavior::Fail(status)).await
    }

    async fn spawn(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
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
            shutdown_tx: Some(shutdown_tx),
            state,
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{"id": "gpt-4o-mini", "object": "model"}]
    }))
}

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        authorization,
        body: body.clone(),
    });

    match state.behavior {
        Behavior::Fail(status) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "mock upstream failure",
        )
            .into_response(),
        Behavior::Reply(ref reply) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": body["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": reply},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
    }
}
