//! Token authentication
//!
//! One shared token gates both the client and admin APIs. OpenAI-dialect
//! paths authenticate with `Authorization: Bearer`, the Anthropic dialect
//! with `x-api-key`. An empty configured token disables the check entirely.

use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::web;
use tracing::debug;

/// Middleware entry point, applied to the `/v1` and `/api` scopes
pub async fn require_token(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let token = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.settings.token.clone())
        .unwrap_or_default();

    if token.is_empty() {
        return next.call(req).await;
    }

    if is_authorized(&req, &token) {
        next.call(req).await
    } else {
        debug!(path = %req.path(), "rejecting request with missing or wrong token");
        Err(GatewayError::Unauthorized("invalid or missing token".to_string()).into())
    }
}

fn is_authorized(req: &ServiceRequest, token: &str) -> bool {
    if req.path().starts_with("/v1/messages") {
        header_value(req, "x-api-key") == Some(token)
    } else {
        header_value(req, "authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            == Some(token)
    }
}

fn header_value<'a>(req: &'a ServiceRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
