//! # banter-protocol
//!
//! Wire protocol definitions for the Banter chat client.
//!
//! The Banter protocol exchanges JSON text frames over a single
//! persistent WebSocket. This crate defines the envelope types and the
//! codec that classifies inbound payloads and encodes outbound frames.
//!
//! ## Frame shapes
//!
//! Client → server:
//!
//! - Login (sent once when the socket opens): `{"username": "alice"}`
//! - Chat send: `{"content": "hello"}` (the server attaches the
//!   login-bound username)
//! - Logout: `{"type": "logout"}`
//!
//! Server → client:
//!
//! - Chat broadcast: `{"username", "content", "timestamp"}`
//! - Roster broadcast: `{"type": "userList", "users": [...]}`
//!
//! ## Example
//!
//! ```rust
//! use banter_protocol::{classify, Inbound, Outbound};
//!
//! let frame = Outbound::chat("hello");
//! assert_eq!(frame.encode(), r#"{"content":"hello"}"#);
//!
//! let inbound = classify(r#"{"type":"userList","users":[]}"#);
//! assert!(matches!(inbound, Inbound::Roster(_)));
//! ```

pub mod codec;
pub mod frames;

pub use codec::{classify, Inbound};
pub use frames::{ChatMessage, Outbound, RosterEntry, Timestamp};
