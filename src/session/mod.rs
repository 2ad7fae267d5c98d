/*!
 * Conversation session state.
 *
 * This module provides:
 * - Message and session models
 * - A process-wide store with per-session serialized mutation
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::{SessionEpoch, SessionStore};
pub use models::{ConversationSession, Message, Role};
