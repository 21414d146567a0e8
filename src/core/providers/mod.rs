//! Provider adapters
//!
//! Each upstream dialect gets one adapter. Adapters are built from a
//! provider row's opaque `config` blob and own two jobs: issue the upstream
//! HTTP call (with the `model` field swapped for the upstream name), and
//! pull token usage out of the accounting copy of the response.

pub mod anthropic;
pub mod openai;

use crate::utils::error::{GatewayError, Result};
use bytes::Bytes;
use std::time::Duration;

/// Wire dialect family: determines both the client surface and the
/// matching adapter variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderStyle {
    OpenAI,
    Anthropic,
}

impl ProviderStyle {
    /// Parse a style string as stored on a provider row
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(ProviderStyle::OpenAI),
            "anthropic" => Some(ProviderStyle::Anthropic),
            _ => None,
        }
    }

    /// Canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStyle::OpenAI => "openai",
            ProviderStyle::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token counts pulled from an upstream response, best-effort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Unified adapter enum; the sole dispatch point for provider calls
#[derive(Debug, Clone)]
pub enum Adapter {
    OpenAI(openai::OpenAIAdapter),
    Anthropic(anthropic::AnthropicAdapter),
}

impl Adapter {
    /// Build the adapter matching `style` from a provider's config blob.
    /// Blob shape is adapter-interpreted; a blob the adapter cannot read is
    /// a configuration error, not a retryable outcome.
    pub fn from_config(style: ProviderStyle, config: &serde_json::Value) -> Result<Self> {
        match style {
            ProviderStyle::OpenAI => Ok(Adapter::OpenAI(openai::OpenAIAdapter::from_config(
                config,
            )?)),
            ProviderStyle::Anthropic => Ok(Adapter::Anthropic(
                anthropic::AnthropicAdapter::from_config(config)?,
            )),
        }
    }

    /// Issue the upstream chat call.
    ///
    /// Substitutes the `model` field in `raw` with `upstream_model`, attaches
    /// the dialect's auth headers, and posts. The response body is not
    /// consumed; non-2xx statuses come back on the response for the engine to
    /// classify. Only transport-level failures surface as errors.
    pub async fn chat(
        &self,
        client: &reqwest::Client,
        upstream_model: &str,
        raw: &Bytes,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        match self {
            Adapter::OpenAI(a) => a.chat(client, upstream_model, raw, timeout).await,
            Adapter::Anthropic(a) => a.chat(client, upstream_model, raw, timeout).await,
        }
    }

    /// Pull token usage out of the accounting copy of a response body.
    /// Best-effort: malformed or truncated data yields zero counts.
    pub fn parse_usage(&self, body: &[u8], was_stream: bool) -> TokenUsage {
        match self {
            Adapter::OpenAI(a) => a.parse_usage(body, was_stream),
            Adapter::Anthropic(a) => a.parse_usage(body, was_stream),
        }
    }
}

/// Replace the `model` field in a raw JSON body, leaving everything else as
/// the client sent it
pub(crate) fn substitute_model(raw: &Bytes, upstream_model: &str) -> Result<Vec<u8>> {
    let mut body: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| GatewayError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let obj = body
        .as_object_mut()
        .ok_or_else(|| GatewayError::BadRequest("request body must be a JSON object".to_string()))?;
    obj.insert(
        "model".to_string(),
        serde_json::Value::String(upstream_model.to_string()),
    );
    serde_json::to_vec(&body).map_err(GatewayError::Serialization)
}

/// Iterate the `data:` payloads of an SSE body, skipping non-JSON trailers
pub(crate) fn sse_json_payloads(body: &str) -> impl Iterator<Item = serde_json::Value> + '_ {
    body.lines().filter_map(|line| {
        let data = line.strip_prefix("data:")?.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }
        serde_json::from_str(data).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parse_roundtrip() {
        assert_eq!(ProviderStyle::parse("openai"), Some(ProviderStyle::OpenAI));
        assert_eq!(ProviderStyle::parse("OpenAI"), Some(ProviderStyle::OpenAI));
        assert_eq!(
            ProviderStyle::parse("anthropic"),
            Some(ProviderStyle::Anthropic)
        );
        assert_eq!(ProviderStyle::parse("gemini"), None);
        assert_eq!(ProviderStyle::OpenAI.as_str(), "openai");
    }

    #[test]
    fn test_substitute_model_preserves_other_fields() {
        let raw = Bytes::from_static(br#"{"model":"logical","messages":[{"role":"user","content":"hi"}],"temperature":0.5}"#);
        let out = substitute_model(&raw, "upstream-123").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["model"], "upstream-123");
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_substitute_model_rejects_non_object() {
        let raw = Bytes::from_static(b"[1,2,3]");
        assert!(substitute_model(&raw, "m").is_err());
    }

    #[test]
    fn test_sse_payload_iteration_skips_garbage() {
        let body = "data: {\"a\":1}\n\ndata: [DONE]\nnot an sse line\ndata: {broken\ndata: {\"b\":2}\n";
        let values: Vec<_> = sse_json_payloads(body).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["a"], 1);
        assert_eq!(values[1]["b"], 2);
    }

    #[test]
    fn test_from_config_dispatches_by_style() {
        let config = serde_json::json!({"base_url": "https://api.openai.com", "api_key": "sk-test"});
        assert!(matches!(
            Adapter::from_config(ProviderStyle::OpenAI, &config).unwrap(),
            Adapter::OpenAI(_)
        ));
        assert!(matches!(
            Adapter::from_config(ProviderStyle::Anthropic, &config).unwrap(),
            Adapter::Anthropic(_)
        ));
    }
}
