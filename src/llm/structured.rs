//! Structured (JSON) calls on top of free-text chat models.

use super::client::ChatModel;
use crate::error::TaskError;
use serde::de::DeserializeOwned;
use tracing::debug;

const JSON_ENFORCER: &str = "IMPORTANT: You MUST respond ONLY with a valid JSON object that \
strictly adheres to the JSON shape below. Do not include any explanatory text, markdown \
formatting, or anything outside of the JSON structure.";

/// Find the JSON object in a model response.
///
/// Reasoning models prefix their answer with a `<think>` block, so only the
/// text after the last `</think>` is searched. A fenced ```` ```json ```` block
/// wins over a bare object.
pub fn extract_json(text: &str) -> Option<&str> {
    let text = match text.rfind("</think>") {
        Some(pos) => &text[pos + "</think>".len()..],
        None => text,
    };

    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            let block = body[..end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract and deserialize the JSON object in a model response.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, TaskError> {
    let json = extract_json(text)
        .ok_or_else(|| TaskError::Format("no JSON object found in model response".to_string()))?;

    serde_json::from_str(json).map_err(|e| {
        debug!("Unparsable model JSON: {}", json);
        TaskError::Format(format!("model returned invalid JSON: {}", e))
    })
}

/// Ask a model for a JSON object of the given shape.
pub async fn structured<T: DeserializeOwned>(
    model: &dyn ChatModel,
    system: &str,
    user: &str,
    shape: &str,
) -> Result<T, TaskError> {
    let system = format!("{}\n\n{}\n\nJSON shape:\n{}", system.trim(), JSON_ENFORCER, shape);
    let reply = model.complete(&system, user).await?;
    parse_json(&reply)
}

/// Have a formatter model distill free text into a JSON object.
pub async fn format_text<T: DeserializeOwned>(
    model: &dyn ChatModel,
    system: &str,
    text: &str,
    shape: &str,
) -> Result<T, TaskError> {
    let user = format!(
        "Here is a block of unstructured text. Extract the key information and format it \
         into the required JSON object.\n\nTEXT:\n\"\"\"\n{}\n\"\"\"",
        text.trim()
    );
    structured(model, system, &user, shape).await
}
