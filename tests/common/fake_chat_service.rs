/*!
 * In-process fake of the chat service
 */

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// How the fake chat service answers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChatServiceMode {
    /// `choices[]` reply echoing the last user message
    Echo,
    /// HTTP 500 on every chat request
    Broken,
    /// Echo, but only after `delay_ms`
    Stall { delay_ms: u64 },
}

#[derive(Clone)]
struct ChatServiceState {
    mode: ChatServiceMode,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Running fake chat service
pub struct FakeChatService {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeChatService {
    pub async fn start(mode: ChatServiceMode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ChatServiceState {
            mode,
            requests: requests.clone(),
        };
        let router = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state);
        let base_url = super::spawn_router(router).await;
        Self { base_url, requests }
    }

    /// Chat request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    /// `(role, content)` pairs of the latest request
    pub fn last_messages(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .last()
            .and_then(|body| body["messages"].as_array().cloned())
            .unwrap_or_default()
            .iter()
            .map(|m| {
                (
                    m["role"].as_str().unwrap_or_default().to_string(),
                    m["content"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

async fn chat_completions(State(state): State<ChatServiceState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.requests.lock().push(body.clone());

    match state.mode {
        ChatServiceMode::Broken => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "model crashed"})));
        }
        ChatServiceMode::Stall { delay_ms } => tokio::time::sleep(Duration::from_millis(delay_ms)).await,
        ChatServiceMode::Echo => {}
    }

    let last_user = body["messages"]
        .as_array()
        .and_then(|messages| messages.iter().rev().find(|m| m["role"] == "user"))
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": format!("reply to: {}", last_user)}}]
        })),
    )
}
