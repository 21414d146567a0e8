//! OpenAI-style provider adapter

use super::{sse_json_payloads, substitute_model, TokenUsage};
use crate::utils::error::{GatewayError, Result};
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

/// Adapter-interpreted slice of a provider's config blob
#[derive(Debug, Clone, Deserialize)]
struct OpenAIConfig {
    base_url: String,
    api_key: String,
}

/// Adapter for OpenAI-compatible upstreams
#[derive(Debug, Clone)]
pub struct OpenAIAdapter {
    base_url: String,
    api_key: String,
}

impl OpenAIAdapter {
    /// Build from a provider config blob (`{base_url, api_key}`)
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        let config: OpenAIConfig = serde_json::from_value(config.clone())
            .map_err(|e| GatewayError::Config(format!("openai provider config: {}", e)))?;
        url::Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Config(format!("openai base_url: {}", e)))?;
        Ok(Self {
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    /// Endpoint URL, auto-suffixing `/v1` when the configured base lacks it
    fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
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
            .post(self.chat_url())
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamTransport(e.to_string()))
    }

    /// Token usage from a response body: last SSE chunk carrying `usage` for
    /// streams, top-level `usage` for JSON
    pub fn parse_usage(&self, body: &[u8], was_stream: bool) -> TokenUsage {
        let text = String::from_utf8_lossy(body);
        let usage = if was_stream {
            sse_json_payloads(&text)
                .filter_map(|chunk| chunk.get("usage").filter(|u| u.is_object()).cloned())
                .last()
        } else {
            serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("usage").cloned())
        };

        let Some(usage) = usage else {
            return TokenUsage::default();
        };
        let field = |name: &str| usage.get(name).and_then(|v| v.as_i64()).unwrap_or(0);
        let prompt_tokens = field("prompt_tokens");
        let completion_tokens = field("completion_tokens");
        let mut total_tokens = field("total_tokens");
        if total_tokens == 0 {
            total_tokens = prompt_tokens + completion_tokens;
        }
        TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(base_url: &str) -> OpenAIAdapter {
        OpenAIAdapter::from_config(&serde_json::json!({
            "base_url": base_url,
            "api_key": "sk-test",
        }))
        .unwrap()
    }

    #[test]
    fn test_chat_url_suffixes_v1() {
        assert_eq!(
            adapter("https://api.openai.com").chat_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            adapter("https://api.openai.com/").chat_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            adapter("https://proxy.example.com/v1").chat_url(),
            "https://proxy.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_config_requires_fields() {
        let err = OpenAIAdapter::from_config(&serde_json::json!({"base_url": "x"})).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_parse_usage_json() {
        let body = br#"{"choices":[{"message":{"content":"hello"}}],"usage":{"prompt_tokens":3,"completion_tokens":5,"total_tokens":8}}"#;
        let usage = adapter("http://x").parse_usage(body, false);
        assert_eq!(
            usage,
            TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 5,
                total_tokens: 8
            }
        );
    }

    #[test]
    fn test_parse_usage_json_computes_missing_total() {
        let body = br#"{"usage":{"prompt_tokens":3,"completion_tokens":5}}"#;
        let usage = adapter("http://x").parse_usage(body, false);
        assert_eq!(usage.total_tokens, 8);
    }

    #[test]
    fn test_parse_usage_sse_takes_last_chunk() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"he\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}],\"usage\":null}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":2,\"total_tokens\":12}}\n\n",
            "data: [DONE]\n\n",
        );
        let usage = adapter("http://x").parse_usage(body.as_bytes(), true);
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 2);
        assert_eq!(usage.total_tokens, 12);
    }

    #[test]
    fn test_parse_usage_tolerates_garbage() {
        let usage = adapter("http://x").parse_usage(b"data: {trunca", true);
        assert_eq!(usage, TokenUsage::default());
        let usage = adapter("http://x").parse_usage(b"\xff\xfe not json", false);
        assert_eq!(usage, TokenUsage::default());
    }
}
