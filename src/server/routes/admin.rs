//! Admin CRUD endpoints
//!
//! Providers, models, and mappings are the routing tables dispatch reads;
//! chat logs are the accounting trail it writes. Deletes are soft
//! everywhere: the rows stay but stop appearing in reads and in dispatch.

use crate::server::state::AppState;
use crate::storage::database::{MappingDraft, ModelDraft, ProviderDraft};
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Pagination query for the log listing
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    page: u64,
    #[serde(default = "default_page_size")]
    page_size: u64,
}

fn default_page_size() -> u64 {
    50
}

// ---- providers -----------------------------------------------------------

pub async fn list_providers(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_providers().await?))
}

pub async fn create_provider(
    state: web::Data<AppState>,
    draft: web::Json<ProviderDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Created().json(state.db.create_provider(draft.into_inner()).await?))
}

pub async fn update_provider(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    draft: web::Json<ProviderDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(
        state
            .db
            .update_provider(id.into_inner(), draft.into_inner())
            .await?,
    ))
}

pub async fn delete_provider(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    state.db.delete_provider(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({"deleted": true})))
}

// ---- models --------------------------------------------------------------

pub async fn list_models(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_models().await?))
}

pub async fn create_model(
    state: web::Data<AppState>,
    draft: web::Json<ModelDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Created().json(state.db.create_model(draft.into_inner()).await?))
}

pub async fn update_model(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    draft: web::Json<ModelDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(
        state
            .db
            .update_model(id.into_inner(), draft.into_inner())
            .await?,
    ))
}

pub async fn delete_model(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse> {
    state.db.delete_model(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({"deleted": true})))
}

// ---- mappings ------------------------------------------------------------

pub async fn list_mappings(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.db.list_mappings().await?))
}

pub async fn create_mapping(
    state: web::Data<AppState>,
    draft: web::Json<MappingDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Created().json(state.db.create_mapping(draft.into_inner()).await?))
}

pub async fn update_mapping(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    draft: web::Json<MappingDraft>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(
        state
            .db
            .update_mapping(id.into_inner(), draft.into_inner())
            .await?,
    ))
}

pub async fn delete_mapping(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    state.db.delete_mapping(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({"deleted": true})))
}

// ---- chat logs -----------------------------------------------------------

pub async fn list_logs(
    state: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse> {
    let logs = state.db.list_chat_logs(query.page, query.page_size).await?;
    Ok(HttpResponse::Ok().json(logs))
}
