//! Inbound payload classification.
//!
//! Every raw text frame received from the server resolves to exactly
//! one [`Inbound`] variant. Classification is pure and total: malformed
//! or unrecognized payloads become [`Inbound::Malformed`] /
//! [`Inbound::Ignored`] instead of errors, so decoding never raises to
//! the connection driving it.

use serde_json::Value;

use crate::frames::{ChatMessage, RosterEntry, Timestamp};

/// Pseudo-user the server uses for synthetic announcements.
pub const SYSTEM_USER: &str = "system";

/// Wire field that tags typed broadcasts.
const TYPE_FIELD: &str = "type";

/// Tag value of a roster broadcast.
const USER_LIST_TYPE: &str = "userList";

/// A classified inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Full-replacement snapshot of the online-user roster.
    Roster(Vec<RosterEntry>),
    /// One chat message broadcast.
    Message(ChatMessage),
    /// Valid JSON that is neither a roster nor a chat message, or a
    /// known duplicate announcement. Dropped without dispatch.
    Ignored,
    /// Payload that is not parseable as JSON at all. Dropped without
    /// dispatch and never surfaced as an error.
    Malformed,
}

/// Classify one raw inbound text frame.
///
/// Resolution order:
///
/// 1. not JSON → [`Inbound::Malformed`]
/// 2. top-level `type == "userList"` → [`Inbound::Roster`] (an absent
///    or ill-shaped `users` field degrades to [`Inbound::Ignored`])
/// 3. a `"system"` sender whose string `content` itself parses to a
///    `type == "userList"` document → [`Inbound::Ignored`]; the server
///    wraps a duplicate roster announcement this way and the client
///    suppresses it
/// 4. non-empty `username` and `content` plus a `timestamp` →
///    [`Inbound::Message`]
/// 5. anything else → [`Inbound::Ignored`]
#[must_use]
pub fn classify(raw: &str) -> Inbound {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return Inbound::Malformed,
    };

    if value.get(TYPE_FIELD).and_then(Value::as_str) == Some(USER_LIST_TYPE) {
        return match value.get("users") {
            Some(users) => match serde_json::from_value::<Vec<RosterEntry>>(users.clone()) {
                Ok(entries) => Inbound::Roster(entries),
                Err(_) => Inbound::Ignored,
            },
            None => Inbound::Ignored,
        };
    }

    if is_wrapped_roster_announcement(&value) {
        return Inbound::Ignored;
    }

    match serde_json::from_value::<ChatMessage>(value) {
        Ok(message) if has_required_fields(&message) => Inbound::Message(message),
        _ => Inbound::Ignored,
    }
}

/// Detect the duplicate roster announcement the server emits through
/// the `"system"` pseudo-user: a chat-shaped payload whose `content`
/// is itself a serialized `userList` document.
fn is_wrapped_roster_announcement(value: &Value) -> bool {
    if value.get("username").and_then(Value::as_str) != Some(SYSTEM_USER) {
        return false;
    }
    let Some(content) = value.get("content").and_then(Value::as_str) else {
        return false;
    };
    match serde_json::from_str::<Value>(content) {
        Ok(inner) => inner.get(TYPE_FIELD).and_then(Value::as_str) == Some(USER_LIST_TYPE),
        // Content is not JSON: a plain message from "system", let it
        // fall through to chat classification.
        Err(_) => false,
    }
}

fn has_required_fields(message: &ChatMessage) -> bool {
    if message.username.is_empty() || message.content.is_empty() {
        return false;
    }
    match &message.timestamp {
        Timestamp::Text(text) => !text.is_empty(),
        Timestamp::Number(_) => true,
    }
}
