use crate::error::{GenerateError, Result};
use serde_json::Value;

/// Extracts `choices[0].message.content` from a chat-completion response.
///
/// Unparsable bodies, any missing or mistyped step of that path and an empty
/// content string all map to [`GenerateError::InvalidJson`].
pub fn extract_content(body: &[u8]) -> Result<String> {
    let document: Value = serde_json::from_slice(body)?;
    match first_choice_content(&document) {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => Err(GenerateError::InvalidJson),
    }
}

fn first_choice_content(document: &Value) -> Option<&str> {
    document
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")
        .filter(|message| message.is_object())?
        .get("content")?
        .as_str()
}
