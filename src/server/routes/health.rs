//! Health endpoint

use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `GET /health`: liveness plus one database round-trip
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.db.health_check().await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
