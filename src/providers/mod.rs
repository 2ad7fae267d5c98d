/*!
 * Chat service clients.
 *
 * This module contains client implementations for the chat service:
 * - Ollama: OpenAI-compatible chat-completions endpoint plus model management
 * - Mock: scripted in-process provider for tests and local development
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all chat providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the chat orchestrator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod mock;
pub mod ollama;

pub use ollama::{ChatCompletionRequest, ChatMessage, Ollama};
