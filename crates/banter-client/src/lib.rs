//! # banter-client
//!
//! WebSocket session connection for the Banter chat client.
//!
//! A [`SessionConnection`] owns one socket per logical login. It dials
//! the configured endpoint, sends the login frame the moment the socket
//! opens, and pumps every inbound text frame through the protocol
//! classifier into a [`banter_core::Dispatcher`]. Outbound sends are
//! fire-and-forget: they transmit only while the transport is open and
//! are dropped silently otherwise.
//!
//! The connection does not self-heal. Transport close and error events
//! move it to [`ConnectionState::Closed`]; re-establishing a session is
//! a fresh caller-initiated [`SessionConnection::connect`].

pub mod connection;
pub mod endpoint;

pub use connection::{ClientError, ConnectionState, SessionConnection};
pub use endpoint::Endpoint;
