/*!
 * Mock chat provider.
 *
 * This module provides a scripted provider that simulates different chat service behaviors:
 * - `MockProvider::working()` - answers in `choices[]` shape, echoing the last user message
 * - `MockProvider::flat()` - answers with a flat `{"result": ...}` object
 * - `MockProvider::failing()` - always fails with an API error
 * - `MockProvider::slow(ms)` - answers after a delay, with a flat `text` field
 *
 * Every request is recorded so callers can inspect what would have been sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::chat::reply::extract_reply;
use crate::errors::ProviderError;
use crate::providers::ollama::ChatCompletionRequest;
use crate::providers::Provider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// OpenAI-style `choices[]` reply
    Working,
    /// Flat `result` field reply
    Flat,
    /// Always fails with an error
    Failing,
    /// Answers after a delay
    Slow { delay_ms: u64 },
}

/// Mock provider for testing chat behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that answers with a flat object
    pub fn flat() -> Self {
        Self::new(MockBehavior::Flat)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().clone()
    }

    /// Most recent request, if any
    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().last().cloned()
    }

    fn echo(request: &ChatCompletionRequest) -> String {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("echo: {}", last_user)
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = ChatCompletionRequest;
    type Response = Value;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => Ok(json!({
                "choices": [{"message": {"role": "assistant", "content": Self::echo(&request)}}]
            })),
            MockBehavior::Flat => Ok(json!({ "result": Self::echo(&request) })),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated API failure".to_string(),
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(json!({ "text": Self::echo(&request) }))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        extract_reply(response)
    }
}
