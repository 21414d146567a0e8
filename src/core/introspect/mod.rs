//! Request introspection
//!
//! Pulls the handful of routing-relevant facts out of an incoming request
//! body without re-serializing it: the raw bytes travel to the upstream
//! adapter untouched.

pub mod anthropic;
pub mod openai;

use crate::core::providers::ProviderStyle;
use crate::utils::error::Result;
use bytes::Bytes;

/// What dispatch needs to know about a request
#[derive(Debug, Clone)]
pub struct RequestProfile {
    /// Logical model name the client asked for
    pub model: String,
    /// Whether the client requested a streaming response
    pub stream: bool,
    /// Whether the request carries tool definitions
    pub tool_call: bool,
    /// Whether the request demands schema-constrained output
    pub structured_output: bool,
    /// Whether any message carries image input
    pub image: bool,
    /// The original body, byte-for-byte
    pub raw: Bytes,
}

/// Parse a request body according to its wire dialect
pub fn inspect(style: ProviderStyle, raw: Bytes) -> Result<RequestProfile> {
    match style {
        ProviderStyle::OpenAI => openai::inspect(raw),
        ProviderStyle::Anthropic => anthropic::inspect(raw),
    }
}
