/*!
 * Reply extraction from chat service payloads.
 *
 * Chat services answer in several shapes: OpenAI-style `choices[]` with either a
 * `message` or a streaming `delta`, or a flat object carrying the text in a
 * well-known field. Extraction never fails; an unrecognized payload is
 * returned serialized.
 */

use serde_json::Value;

/// Flat fields checked, in order, when there are no usable choices
const FLAT_FIELDS: &[&str] = &["result", "text", "output"];

/// Extract the assistant text from a chat service payload
pub fn extract_reply(payload: &Value) -> String {
    if let Some(reply) = from_choices(payload) {
        return reply;
    }

    let flat = FLAT_FIELDS
        .iter()
        .find_map(|field| payload.get(*field).and_then(Value::as_str));
    match flat {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => payload.to_string(),
    }
}

fn from_choices(payload: &Value) -> Option<String> {
    let choices = payload.get("choices")?.as_array()?;

    let parts: Vec<&str> = choices
        .iter()
        .filter_map(choice_content)
        .filter(|content| !content.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join("\n"))
}

// `message` wins when it is a non-empty object, otherwise `delta`
fn choice_content(choice: &Value) -> Option<&str> {
    let body = ["message", "delta"]
        .iter()
        .filter_map(|key| choice.get(*key))
        .find(|value| value.as_object().is_some_and(|object| !object.is_empty()))?;
    body.get("content")?.as_str()
}
