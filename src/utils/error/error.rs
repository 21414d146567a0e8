//! Error types for the gateway
//!
//! One taxonomy for everything the gateway surfaces: pool resolution
//! failures map to 400, dispatch exhaustion to 502/504, everything else
//! to the usual suspects.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unparsable request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Token mismatch on a gated route
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No model row for the requested logical name
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A model exists but has no mappings at all
    #[error("Model {0} has no provider mappings")]
    NoMappings(String),

    /// Mappings exist, but none of their providers match the request style
    #[error("Model {model} has no providers of style {style}")]
    NoProvidersForStyle {
        /// Logical model name
        model: String,
        /// Requested wire dialect
        style: String,
    },

    /// Mappings exist, but capability filtering removed all of them
    #[error("Model {0} has no mapping supporting the requested capabilities")]
    NoEligibleMapping(String),

    /// Weighted pick over an empty pool
    #[error("Pool is empty")]
    EmptyPool,

    /// All candidates removed before a successful attempt
    #[error("Upstream exhausted for model {0}")]
    Exhausted(String),

    /// Attempt budget spent without a success
    #[error("Upstream exhausted for model {model} after {attempts} attempts")]
    MaxRetriesReached {
        /// Logical model name
        model: String,
        /// Attempts made
        attempts: u32,
    },

    /// Request budget elapsed before a new attempt could start
    #[error("Retry budget of {timeout_seconds}s elapsed for model {model}")]
    RetryTimeout {
        /// Logical model name
        model: String,
        /// Per-request budget in seconds
        timeout_seconds: u64,
    },

    /// Transport-level failure talking to an upstream provider
    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    /// Missing admin resources
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors on admin writes
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Machine-readable error code used in response bodies
    fn code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "configuration_error",
            GatewayError::Database(_) => "database_error",
            GatewayError::Serialization(_) => "serialization_error",
            GatewayError::Io(_) => "io_error",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::ModelNotFound(_) => "model_not_found",
            GatewayError::NoMappings(_) => "no_mappings",
            GatewayError::NoProvidersForStyle { .. } => "no_providers_for_style",
            GatewayError::NoEligibleMapping(_) => "no_eligible_mapping",
            GatewayError::EmptyPool | GatewayError::Exhausted(_) => "upstream_exhausted",
            GatewayError::MaxRetriesReached { .. } => "upstream_exhausted",
            GatewayError::RetryTimeout { .. } => "retry_timeout",
            GatewayError::UpstreamTransport(_) => "upstream_transport",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Validation(_) => "validation_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_)
            | GatewayError::ModelNotFound(_)
            | GatewayError::NoMappings(_)
            | GatewayError::NoProvidersForStyle { .. }
            | GatewayError::NoEligibleMapping(_)
            | GatewayError::Serialization(_)
            | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::EmptyPool
            | GatewayError::Exhausted(_)
            | GatewayError::MaxRetriesReached { .. }
            | GatewayError::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::RetryTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Config(_)
            | GatewayError::Database(_)
            | GatewayError::Io(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": self.code(),
            }
        }))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::UpstreamTransport(err.to_string())
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        GatewayError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::ModelNotFound("gpt-4".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Unauthorized("token mismatch".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::Exhausted("gpt-4".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::MaxRetriesReached {
                model: "gpt-4".into(),
                attempts: 3
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::RetryTimeout {
                model: "gpt-4".into(),
                timeout_seconds: 30
            }
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_error_body_shape() {
        let err = GatewayError::NoEligibleMapping("gpt-4".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
