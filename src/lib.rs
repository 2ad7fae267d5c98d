/*!
 * # mtbridge - translation bridge for a chat model
 *
 * A Rust service that translates free-form documents with a local neural
 * translation engine and relays multi-turn conversations to a chat model.
 *
 * ## Features
 *
 * - Paragraph-aware sentence segmentation and structure-preserving reassembly
 * - Batched beam-search translation with a one-time switch to a fallback device
 * - Detokenization and cleanup of engine output
 * - In-memory conversation sessions with per-session serialized updates
 * - Optional translation of the latest user turn before it reaches the chat model
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The document translation pipeline:
 *   - `translation::segmenter`: Sentence segmentation
 *   - `translation::batch`: Batching and device fallback
 *   - `translation::formatting`: Detokenization and cleanup
 *   - `translation::reassembler`: Document reassembly
 *   - `translation::core`: The translation service
 * - `session`: Conversation session store
 * - `chat`: Chat orchestration and reply parsing
 * - `providers`: Chat service clients (`providers::ollama`)
 * - `web`: HTTP routes and handlers
 * - `file_utils`: Model directory utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod chat;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod session;
pub mod translation;
pub mod web;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chat::{ChatOrchestrator, ChatOutcome, ChatTurn};
pub use errors::{EngineError, ProviderError, ServiceError, TokenizerError};
pub use session::SessionStore;
pub use translation::TranslationService;
