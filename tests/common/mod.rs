//! Shared test utilities: a scripted A2A agent served by axum.
//!
//! The agent answers card requests from its configuration and answers each
//! JSON-RPC POST with the next [`Reply`] in its script.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use a2a_cli::sink::MemorySink;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// How the agent answers one JSON-RPC request.
pub enum Reply {
    /// SSE body made of these chunks, sent `delay` apart. With `hang` the
    /// body stays open after the last chunk.
    Sse {
        chunks: Vec<String>,
        delay: Duration,
        hang: bool,
    },
    /// JSON-RPC success response with this `result`.
    Result(Value),
    /// JSON-RPC error response.
    Error { code: i64, message: String },
    /// Plain HTTP error status.
    Status(u16),
    /// Never answer.
    Stall,
}

impl Reply {
    pub fn sse(chunks: Vec<String>) -> Self {
        Reply::Sse {
            chunks,
            delay: Duration::ZERO,
            hang: false,
        }
    }

    pub fn sse_then_hang(chunks: Vec<String>) -> Self {
        Reply::Sse {
            chunks,
            delay: Duration::ZERO,
            hang: true,
        }
    }
}

/// Configuration of a scripted agent.
pub struct ScriptedAgent {
    pub name: String,
    pub streaming: bool,
    /// Serve the card only under the legacy `/.well-known/agent.json` path.
    pub legacy_card_path: bool,
    pub replies: Vec<Reply>,
}

impl ScriptedAgent {
    pub fn streaming(replies: Vec<Reply>) -> Self {
        Self {
            name: "Scripted Agent".to_string(),
            streaming: true,
            legacy_card_path: false,
            replies,
        }
    }

    pub fn blocking(replies: Vec<Reply>) -> Self {
        Self {
            streaming: false,
            ..Self::streaming(replies)
        }
    }
}

#[derive(Clone)]
struct AppState {
    card: Value,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// A running scripted agent.
pub struct TestAgent {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestAgent {
    /// Every JSON-RPC request body received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a scripted agent on a random port.
pub async fn start_agent(agent: ScriptedAgent) -> TestAgent {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let card = json!({
        "name": agent.name,
        "description": "A scripted agent for testing",
        "version": "0.1.0",
        "url": format!("{}/a2a", base_url),
        "capabilities": {"streaming": agent.streaming},
        "defaultInputModes": ["text"],
        "defaultOutputModes": ["text"],
        "skills": []
    });

    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = AppState {
        card,
        replies: Arc::new(Mutex::new(agent.replies.into_iter().collect())),
        requests: requests.clone(),
    };

    let card_path = if agent.legacy_card_path {
        "/.well-known/agent.json"
    } else {
        "/.well-known/agent-card.json"
    };

    let app = Router::new()
        .route(card_path, get(serve_card))
        .route("/a2a", post(rpc))
        .with_state(state);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestAgent {
        base_url,
        requests,
        _handle: handle,
    }
}

async fn serve_card(State(state): State<AppState>) -> Json<Value> {
    Json(state.card)
}

async fn rpc(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(body);
    let reply = state.replies.lock().unwrap().pop_front();

    match reply {
        Some(Reply::Sse {
            chunks,
            delay,
            hang,
        }) => {
            let stream = async_stream::stream! {
                for chunk in chunks {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    yield Ok::<_, Infallible>(chunk);
                }
                if hang {
                    std::future::pending::<()>().await;
                }
            };
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .body(Body::from_stream(stream))
                .unwrap()
        }
        Some(Reply::Result(result)) => {
            Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response()
        }
        Some(Reply::Error { code, message }) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .into_response(),
        Some(Reply::Status(code)) => (
            StatusCode::from_u16(code).unwrap(),
            "scripted failure".to_string(),
        )
            .into_response(),
        Some(Reply::Stall) => {
            std::future::pending::<()>().await;
            StatusCode::OK.into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "script exhausted").into_response(),
    }
}

/// One typed SSE frame.
pub fn frame(event: &str, data: Value) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// One untyped SSE frame carrying a JSON-RPC result envelope.
pub fn envelope(result: Value) -> String {
    format!(
        "data: {}\n\n",
        json!({"jsonrpc": "2.0", "id": "1", "result": result})
    )
}

pub fn task(id: &str, state: &str) -> Value {
    json!({"kind": "task", "id": id, "contextId": "ctx", "status": {"state": state}})
}

pub fn status(task_id: &str, state: &str, is_final: bool) -> Value {
    json!({
        "kind": "status-update",
        "taskId": task_id,
        "contextId": "ctx",
        "status": {"state": state},
        "final": is_final
    })
}

pub fn status_with_message(task_id: &str, state: &str, text: &str) -> Value {
    json!({
        "kind": "status-update",
        "taskId": task_id,
        "contextId": "ctx",
        "status": {
            "state": state,
            "message": {"kind": "message", "messageId": "s1", "role": "agent", "parts": [{"kind": "text", "text": text}]}
        },
        "final": true
    })
}

pub fn artifact(task_id: &str, name: &str, text: &str) -> Value {
    let parts = if text.is_empty() {
        json!([])
    } else {
        json!([{"kind": "text", "text": text}])
    };
    json!({
        "kind": "artifact-update",
        "taskId": task_id,
        "contextId": "ctx",
        "artifact": {"artifactId": format!("{}-{}", name, text.len()), "name": name, "parts": parts}
    })
}

/// Poll until the sink holds at least `n` lines.
pub async fn wait_for_lines(sink: &MemorySink, n: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sink.len() < n {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {} lines, got {:?}",
            n,
            sink.texts()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
