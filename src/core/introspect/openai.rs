//! OpenAI-dialect request introspection

use super::RequestProfile;
use crate::utils::error::{GatewayError, Result};
use bytes::Bytes;
use serde_json::Value;

/// Extract routing facts from an OpenAI chat-completions body
pub fn inspect(raw: Bytes) -> Result<RequestProfile> {
    let body: Value = serde_json::from_slice(&raw)
        .map_err(|e| GatewayError::BadRequest(format!("invalid JSON body: {}", e)))?;

    let model = body
        .get("model")
        .and_then(|m| m.as_str())
        .ok_or_else(|| GatewayError::BadRequest("missing model field".to_string()))?
        .to_string();

    let stream = body
        .get("stream")
        .and_then(|s| s.as_bool())
        .unwrap_or(false);

    let tool_call = body
        .get("tools")
        .and_then(|t| t.as_array())
        .map(|t| !t.is_empty())
        .unwrap_or(false);

    let structured_output = body
        .get("response_format")
        .and_then(|f| f.get("type"))
        .and_then(|t| t.as_str())
        .map(|t| t == "json_schema")
        .unwrap_or(false);

    let image = has_image_content(&body);

    Ok(RequestProfile {
        model,
        stream,
        tool_call,
        structured_output,
        image,
        raw,
    })
}

/// Any message content part of type `image_url` counts as image input
fn has_image_content(body: &Value) -> bool {
    let Some(messages) = body.get("messages").and_then(|m| m.as_array()) else {
        return false;
    };
    messages.iter().any(|message| {
        message
            .get("content")
            .and_then(|c| c.as_array())
            .map(|parts| {
                parts.iter().any(|part| {
                    part.get("type").and_then(|t| t.as_str()) == Some("image_url")
                })
            })
            .unwrap_or(false)
    })
}
