//! Envelope types for the Banter protocol.
//!
//! Inbound envelopes are produced by the codec during classification;
//! outbound frames are encoded as compact JSON text.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// A message timestamp as it appears on the wire.
///
/// The server serializes timestamps as RFC 3339 strings, but the frame
/// contract only promises string-or-number, so both are accepted and
/// preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Textual timestamp (e.g. RFC 3339).
    Text(String),
    /// Numeric timestamp (e.g. epoch milliseconds).
    Number(f64),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Text(s) => write!(f, "{}", s),
            Timestamp::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Timestamp::Text(s.to_string())
    }
}

/// One chat message as broadcast by the server.
///
/// Messages are immutable once decoded. They carry no unique id;
/// identity is positional in the history, and duplicates are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub username: String,
    /// Message body.
    pub content: String,
    /// Server-assigned send time.
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Create a new chat message.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<Timestamp>,
    ) -> Self {
        Self {
            username: username.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// One entry of the online-user roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Display name of the user.
    pub username: String,
    /// Last activity time, as reported by the server.
    pub last_seen: String,
}

impl RosterEntry {
    /// Create a new roster entry.
    #[must_use]
    pub fn new(username: impl Into<String>, last_seen: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            last_seen: last_seen.into(),
        }
    }
}

/// A client → server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Login handshake, sent exactly once when the socket opens.
    Login {
        /// Display name to bind to this connection.
        username: String,
    },
    /// Chat send. The username is implicit: the server attaches the
    /// identity bound by the login frame.
    Chat {
        /// Message body.
        content: String,
    },
    /// Logout announcement.
    Logout,
}

impl Outbound {
    /// Create a login frame.
    #[must_use]
    pub fn login(username: impl Into<String>) -> Self {
        Outbound::Login {
            username: username.into(),
        }
    }

    /// Create a chat-send frame.
    #[must_use]
    pub fn chat(content: impl Into<String>) -> Self {
        Outbound::Chat {
            content: content.into(),
        }
    }

    /// Encode the frame as a JSON text payload.
    ///
    /// Encoding is infallible: every variant maps to a closed JSON
    /// shape with stable field names.
    #[must_use]
    pub fn encode(&self) -> String {
        let value = match self {
            Outbound::Login { username } => json!({ "username": username }),
            Outbound::Chat { content } => json!({ "content": content }),
            Outbound::Logout => json!({ "type": "logout" }),
        };
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_encodings() {
        assert_eq!(
            Outbound::login("alice").encode(),
            r#"{"username":"alice"}"#
        );
        assert_eq!(Outbound::chat("hi there").encode(), r#"{"content":"hi there"}"#);
        assert_eq!(Outbound::Logout.encode(), r#"{"type":"logout"}"#);
    }

    #[test]
    fn test_chat_send_omits_username() {
        let encoded = Outbound::chat("hello").encode();
        assert!(!encoded.contains("username"));
    }

    #[test]
    fn test_timestamp_forms() {
        let text: Timestamp = serde_json::from_str(r#""2024-01-01T00:00:00Z""#).unwrap();
        assert_eq!(text, Timestamp::Text("2024-01-01T00:00:00Z".into()));

        let num: Timestamp = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(num, Timestamp::Number(1_700_000_000_000.0));
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(Timestamp::from("t0").to_string(), "t0");
        assert_eq!(Timestamp::Number(5.0).to_string(), "5");
    }
}
