//! Client-facing chat endpoints
//!
//! The two dialect endpoints hand the raw body straight to the dispatch
//! engine; nothing here parses the request beyond what the engine's
//! introspector needs.

use crate::core::providers::ProviderStyle;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `POST /v1/chat/completions`: OpenAI dialect
pub async fn chat_completions(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    state.engine.execute(ProviderStyle::OpenAI, body).await
}

/// `POST /v1/messages`: Anthropic dialect
pub async fn messages(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    state.engine.execute(ProviderStyle::Anthropic, body).await
}

/// `GET /v1/models`: the logical model names this gateway exposes
pub async fn list_models(state: web::Data<AppState>) -> Result<HttpResponse> {
    let models = state.db.list_models().await?;
    let data: Vec<_> = models
        .iter()
        .map(|m| {
            json!({
                "id": m.name,
                "object": "model",
                "created": m.created_at.timestamp(),
                "owned_by": "modelmux",
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({
        "object": "list",
        "data": data,
    })))
}
