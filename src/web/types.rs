//! Request and response bodies of the HTTP surface

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chat::ChatOrchestrator;
use crate::providers::Ollama;
use crate::session::SessionStore;
use crate::translation::TranslationService;

/// Application state shared by every handler
pub struct AppContext {
    /// Absent when the engine could not be loaded on any device
    pub translation: Option<Arc<TranslationService>>,
    pub orchestrator: ChatOrchestrator<Ollama>,
}

impl AppContext {
    pub fn new(translation: Option<Arc<TranslationService>>, orchestrator: ChatOrchestrator<Ollama>) -> Self {
        Self {
            translation,
            orchestrator,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        self.orchestrator.sessions()
    }

    pub fn translator(&self) -> Option<&TranslationService> {
        self.translation.as_deref()
    }
}

pub type SharedContext = Arc<AppContext>;

/// `/send` form
#[derive(Debug, Deserialize)]
pub struct SendForm {
    pub fa_text: String,
}

/// `/api/clear` body
#[derive(Debug, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub translator: bool,
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
