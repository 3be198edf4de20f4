//! Message codec for the inference collaborator.
//!
//! Stored turns are converted into the JSON array of role/content pairs the
//! backend expects, and its reply is pulled back out of the response body.
//! The backend's framing is loose, so decoding tolerates non-canonical and
//! partial JSON instead of failing hard.

use crate::models::StoredMessage;
use serde::{Deserialize, Serialize};

/// Sender identity that maps to the `"assistant"` role; every other sender
/// maps to `"user"`.
pub const ASSISTANT_SENDER: &str = "assistant";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

pub fn role_for_sender(sender: &str) -> &'static str {
    if sender.eq_ignore_ascii_case(ASSISTANT_SENDER) {
        "assistant"
    } else {
        "user"
    }
}

pub fn encode(messages: &[StoredMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| WireMessage {
            role: role_for_sender(&m.sender).to_string(),
            content: m.content.clone(),
        })
        .collect()
}

/// Serializes the history as the wire payload. serde_json escapes backslash
/// and double quote, which is what the wire contract requires.
pub fn encode_json(messages: &[StoredMessage]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&encode(messages))
}

/// Locates the `"reply"` field in a response body.
///
/// A proper JSON object is tried first; otherwise the field is scanned for
/// directly and `\n` / `\"` sequences are unescaped, matching the backend's
/// loose framing. Returns `None` when the field is absent or malformed so
/// callers can substitute a fallback instead of failing.
pub fn extract_reply(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(reply) = value.get("reply").and_then(|v| v.as_str()) {
            return Some(reply.to_string());
        }
    }

    let marker = "\"reply\":\"";
    let start = body.find(marker)? + marker.len();
    let rest = &body[start..];
    let end = rest.rfind("\"}")?;
    Some(rest[..end].replace("\\n", "\n").replace("\\\"", "\""))
}
