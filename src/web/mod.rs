//! HTTP surface
//!
//! Routes:
//! - `POST /send`: translate `fa_text` and relay it to the chat service
//! - `POST /api/chat`: conversation turn with optional translation
//! - `POST /api/clear`: drop a session
//! - `GET /api/health`: liveness and translator availability

pub mod error;
pub mod handlers;
pub mod types;

pub use types::{AppContext, SharedContext};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use tower_http::cors::CorsLayer;

/// Build the application router
pub fn create_router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/send", post(handlers::send))
        .route("/api/chat", post(handlers::chat))
        .route("/api/clear", post(handlers::clear))
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Bind `host:port` and serve until the process stops
pub async fn serve(ctx: SharedContext, host: &str, port: u16) -> Result<()> {
    let address = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind {}", address))?;

    info!("Listening on http://{}", address);
    axum::serve(listener, create_router(ctx))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
