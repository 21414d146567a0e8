//! Anthropic-style provider adapter

use super::{sse_json_payloads, substitute_model, TokenUsage};
use crate::utils::error::{GatewayError, Result};
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

fn default_version() -> String {
    "2023-06-01".to_string()
}

/// Adapter-interpreted slice of a provider's config blob
#[derive(Debug, Clone, Deserialize)]
struct AnthropicConfig {
    base_url: String,
    api_key: String,
    #[serde(default = "default_version")]
    version: String,
}

/// Adapter for Anthropic-compatible upstreams
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    base_url: String,
    api_key: String,
    version: String,
}

impl AnthropicAdapter {
    /// Build from a provider config blob (`{base_url, api_key, version?}`)
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        let config: AnthropicConfig = serde_json::from_value(config.clone())
            .map_err(|e| GatewayError::Config(format!("anthropic provider config: {}", e)))?;
        url::Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Config(format!("anthropic base_url: {}", e)))?;
        Ok(Self {
            base_url: config.base_url,
            api_key: config.api_key,
            version: config.version,
        })
    }

    fn messages_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/messages", base)
        } else {
            format!("{}/v1/messages", base)
        }
    }

    /// Post the (model-substituted) body upstream without consuming the
    /// response
    pub async fn chat(
        &self,
        client: &reqwest::Client,
        upstream_model: &str,
        raw: &Bytes,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let body = substitute_model(raw, upstream_model)?;
        client
            .post(self.messages_url())
            .timeout(timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamTransport(e.to_string()))
    }

    /// Token usage from a response body.
    ///
    /// Streams report input tokens on `message_start` and output tokens on
    /// `message_delta` events; the last delta wins. JSON bodies carry a
    /// top-level `usage`.
    pub fn parse_usage(&self, body: &[u8], was_stream: bool) -> TokenUsage {
        let text = String::from_utf8_lossy(body);

        let (input, output) = if was_stream {
            let mut input = 0;
            let mut output = 0;
            for payload in sse_json_payloads(&text) {
                if let Some(u) = payload.pointer("/message/usage/input_tokens") {
                    input = u.as_i64().unwrap_or(input);
                }
                if let Some(u) = payload.pointer("/usage/output_tokens") {
                    output = u.as_i64().unwrap_or(output);
                }
            }
            (input, output)
        } else {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(v) => (
                    v.pointer("/usage/input_tokens")
                        .and_then(|t| t.as_i64())
                        .unwrap_or(0),
                    v.pointer("/usage/output_tokens")
                        .and_then(|t| t.as_i64())
                        .unwrap_or(0),
                ),
                Err(_) => (0, 0),
            }
        };

        TokenUsage {
            prompt_tokens: input,
            completion_tokens: output,
            total_tokens: input + output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> AnthropicAdapter {
        AnthropicAdapter::from_config(&serde_json::json!({
            "base_url": "https://api.anthropic.com",
            "api_key": "sk-ant-test",
        }))
        .unwrap()
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            adapter().messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
        let a = AnthropicAdapter::from_config(&serde_json::json!({
            "base_url": "https://proxy.example.com/v1/",
            "api_key": "k",
        }))
        .unwrap();
        assert_eq!(a.messages_url(), "https://proxy.example.com/v1/messages");
    }

    #[test]
    fn test_version_defaults() {
        assert_eq!(adapter().version, "2023-06-01");
        let a = AnthropicAdapter::from_config(&serde_json::json!({
            "base_url": "https://api.anthropic.com",
            "api_key": "k",
            "version": "2024-10-22",
        }))
        .unwrap();
        assert_eq!(a.version, "2024-10-22");
    }

    #[test]
    fn test_parse_usage_json() {
        let body = br#"{"content":[{"type":"text","text":"hi"}],"usage":{"input_tokens":7,"output_tokens":4}}"#;
        let usage = adapter().parse_usage(body, false);
        assert_eq!(
            usage,
            TokenUsage {
                prompt_tokens: 7,
                completion_tokens: 4,
                total_tokens: 11
            }
        );
    }

    #[test]
    fn test_parse_usage_sse_accumulates_events() {
        let body = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":9,\"output_tokens\":1}}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"hi\"}}\n\n",
            "event: message_delta\n",
            "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":6}}\n\n",
        );
        let usage = adapter().parse_usage(body.as_bytes(), true);
        assert_eq!(usage.prompt_tokens, 9);
        assert_eq!(usage.completion_tokens, 6);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_usage_truncated_stream_keeps_partial_counts() {
        let body = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":9}}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_bl",
        );
        let usage = adapter().parse_usage(body.as_bytes(), true);
        assert_eq!(usage.prompt_tokens, 9);
        assert_eq!(usage.completion_tokens, 0);
    }
}
