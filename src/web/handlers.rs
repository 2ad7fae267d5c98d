//! Route handlers

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    response::Json,
    Form,
};
use log::{debug, info};

use crate::chat::{ChatOutcome, ChatTurn, RelayOutcome};
use crate::errors::ServiceError;

use super::types::{ClearRequest, ClearResponse, HealthResponse, SendForm, SharedContext};

/// `POST /send`: translate a form field and relay it to the chat service
pub async fn send(
    State(ctx): State<SharedContext>,
    form: Result<Form<SendForm>, FormRejection>,
) -> Result<Json<RelayOutcome>, ServiceError> {
    let Form(form) = form.map_err(|e| ServiceError::BadRequest(format!("fa_text is required: {}", e)))?;
    let outcome = ctx.orchestrator.relay(&form.fa_text, ctx.translator()).await?;
    Ok(Json(outcome))
}

/// `POST /api/chat`: one conversation turn
pub async fn chat(
    State(ctx): State<SharedContext>,
    body: Result<Json<ChatTurn>, JsonRejection>,
) -> Result<Json<ChatOutcome>, ServiceError> {
    let Json(turn) = body.map_err(|e| ServiceError::BadRequest(format!("invalid request body: {}", e)))?;
    let outcome = ctx.orchestrator.chat(turn, ctx.translator()).await?;
    debug!("Session {}: reply of {} chars", outcome.session_id, outcome.reply.chars().count());
    Ok(Json(outcome))
}

/// `POST /api/clear`: drop a session. Always succeeds.
pub async fn clear(State(ctx): State<SharedContext>, body: Option<Json<ClearRequest>>) -> Json<ClearResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    if let Some(session_id) = request.session_id.filter(|id| !id.is_empty()) {
        if ctx.sessions().clear(&session_id) {
            info!("Session {} cleared", session_id);
        }
    }
    Json(ClearResponse { ok: true })
}

/// `GET /api/health`
pub async fn health(State(ctx): State<SharedContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        translator: ctx.translation.is_some(),
    })
}
