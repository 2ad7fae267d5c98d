/*!
 * Chat orchestration.
 *
 * A chat turn records the user's message in its session, optionally
 * translates it, forwards the history to the chat service with the
 * translation standing in for the latest user turn, and records the reply.
 *
 * The user's message is stored before translation is attempted. When
 * translation or the chat service call fails, the session keeps that user
 * turn without an assistant reply; a retry appends a second copy.
 *
 * The outbound history is the snapshot taken when the user's message was
 * stored. If the session is cleared while the turn is in flight, the reply is
 * still returned but is not written back.
 */

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::ChatConfig;
use crate::errors::ServiceError;
use crate::providers::{ChatCompletionRequest, ChatMessage, Provider};
use crate::session::{ConversationSession, Message, Role, SessionStore};
use crate::translation::TranslationService;

/// One chat turn as submitted by a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub use_translation: Option<bool>,
}

impl ChatTurn {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn translated(mut self) -> Self {
        self.use_translation = Some(true);
        self
    }
}

/// Result of a chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub session_id: String,
    /// Translated surrogate, empty when translation was not requested
    pub translated: String,
}

/// Result of a single-shot translate-and-ask relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayOutcome {
    pub fa_text: String,
    pub en_text: String,
    /// Chat service reply, or the error text when the call failed
    pub ollama_response: String,
    pub duration_sec: f64,
}

/// Builds chat service requests from session history
pub struct ChatOrchestrator<P> {
    provider: P,
    sessions: Arc<SessionStore>,
    default_model: String,
    temperature: f32,
    max_tokens: u32,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl<P> ChatOrchestrator<P>
where
    P: Provider<Request = ChatCompletionRequest, Response = Value>,
{
    pub fn new(provider: P, sessions: Arc<SessionStore>, config: &ChatConfig) -> Self {
        Self {
            provider,
            sessions,
            default_model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn request(&self, model: String, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest::new(model, messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
    }

    /// Run one chat turn
    pub async fn chat(&self, turn: ChatTurn, translator: Option<&TranslationService>) -> Result<ChatOutcome, ServiceError> {
        let message = non_empty(turn.message).ok_or_else(|| ServiceError::BadRequest("message is required".to_string()))?;

        let session_id = SessionStore::resolve_id(turn.session_id.as_deref());
        let system_prompt = non_empty(turn.system_prompt);
        let (session, epoch) =
            self.sessions
                .begin_turn(&session_id, system_prompt.as_deref(), Message::user(message.clone()));

        let translated = if turn.use_translation.unwrap_or(false) {
            let service = translator
                .ok_or_else(|| ServiceError::ServiceUnavailable("translator not available on server".to_string()))?;
            let translated = service.translate_text(&message).await?;
            debug!("Session {}: translated user message ({} chars)", session_id, translated.chars().count());
            translated
        } else {
            String::new()
        };

        let surrogate = (!translated.is_empty()).then_some(translated.as_str());
        let messages = build_outbound(&session, &message, surrogate);

        let model = non_empty(turn.model).unwrap_or_else(|| self.default_model.clone());
        let response = self
            .provider
            .complete(self.request(model, messages))
            .await
            .map_err(|e| {
                error!("Error contacting chat service: {}", e);
                ServiceError::from(e)
            })?;

        let reply = P::extract_text(&response);
        if !self
            .sessions
            .append_if_current(&session_id, epoch, Message::assistant(reply.clone()))
        {
            info!("Session {} was cleared during the turn, reply not stored", session_id);
        }

        Ok(ChatOutcome {
            reply,
            session_id,
            translated,
        })
    }

    /// Translate `text` and ask the chat service about it in a fresh, single-turn conversation.
    ///
    /// A chat service failure does not fail the relay; its message is returned in place of the reply.
    pub async fn relay(&self, text: &str, translator: Option<&TranslationService>) -> Result<RelayOutcome, ServiceError> {
        let started = Instant::now();
        let service =
            translator.ok_or_else(|| ServiceError::ServiceUnavailable("translator not available".to_string()))?;

        let en_text = service.translate_text(text).await?;

        let request = self.request(self.default_model.clone(), vec![ChatMessage::new(Role::User.to_string(), en_text.clone())]);
        let ollama_response = match self.provider.complete(request).await {
            Ok(response) => P::extract_text(&response),
            Err(e) => {
                error!("Chat service call for relay failed: {}", e);
                e.to_string()
            }
        };

        let duration_sec = started.elapsed().as_secs_f64();
        info!("Relay finished in {:.2}s", duration_sec);

        Ok(RelayOutcome {
            fa_text: text.to_string(),
            en_text,
            ollama_response,
            duration_sec,
        })
    }
}

/// Outbound message list for `session`.
///
/// Messages are forwarded as stored, except that the latest user message whose
/// content equals `original` is replaced by `surrogate` when one is given.
pub fn build_outbound(session: &ConversationSession, original: &str, surrogate: Option<&str>) -> Vec<ChatMessage> {
    let replace_at = surrogate.and_then(|_| {
        session
            .messages
            .iter()
            .rposition(|m| m.role == Role::User && m.content == original)
    });

    session
        .messages
        .iter()
        .enumerate()
        .map(|(index, m)| match (replace_at, surrogate) {
            (Some(at), Some(text)) if at == index => ChatMessage::new(m.role.to_string(), text),
            _ => ChatMessage::new(m.role.to_string(), m.content.clone()),
        })
        .collect()
}
