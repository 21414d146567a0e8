//! Error handling for the gateway

mod error;

pub use error::{GatewayError, Result};
