//! The session connection.
//!
//! One [`SessionConnection`] instance owns one socket per logical
//! login. Inbound frames are classified by `banter-protocol` and routed
//! to the dispatcher from a dedicated pump task; frames are processed
//! strictly in arrival order and dispatch for a frame completes before
//! the next one is read.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use banter_core::{Dispatcher, OutboundSink};
use banter_protocol::{classify, Outbound};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::endpoint::Endpoint;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Errors surfaced by the caller-initiated dial.
///
/// Everything past the dial (inbound decode, transport close/error
/// events, gated sends) follows the never-raise policy and degrades to
/// a silent drop or a state transition instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connect or WebSocket handshake failed.
    #[error("WebSocket dial failed: {0}")]
    Dial(#[from] WsError),
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Never connected.
    Idle = 0,
    /// Dial in progress.
    Connecting = 1,
    /// Socket open, login frame sent.
    Open = 2,
    /// Disconnected, by request or by transport failure.
    Closed = 3,
}

impl From<ConnectionState> for u8 {
    fn from(state: ConnectionState) -> u8 {
        state as u8
    }
}

impl TryFrom<u8> for ConnectionState {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ConnectionState::Idle),
            1 => Ok(ConnectionState::Connecting),
            2 => Ok(ConnectionState::Open),
            3 => Ok(ConnectionState::Closed),
            _ => Err("Invalid connection state"),
        }
    }
}

/// Atomic cell holding a [`ConnectionState`].
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state.into()))
    }

    fn load(&self) -> ConnectionState {
        ConnectionState::try_from(self.0.load(Ordering::SeqCst))
            .unwrap_or(ConnectionState::Closed)
    }

    fn store(&self, state: ConnectionState) {
        self.0.store(state.into(), Ordering::SeqCst);
    }
}

/// One socket per logical user session.
pub struct SessionConnection {
    endpoint: Endpoint,
    dispatcher: Dispatcher,
    state: Arc<StateCell>,
    sink: Arc<tokio::sync::Mutex<Option<WsSink>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SessionConnection {
    /// Create a connection for the given endpoint.
    ///
    /// Classified inbound frames are routed through `dispatcher`.
    #[must_use]
    pub fn new(endpoint: Endpoint, dispatcher: Dispatcher) -> Self {
        Self {
            endpoint,
            dispatcher,
            state: Arc::new(StateCell::new(ConnectionState::Idle)),
            sink: Arc::new(tokio::sync::Mutex::new(None)),
            pump: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Open the socket and log in as `username`.
    ///
    /// Any prior socket on this instance is closed first; concurrent
    /// opens on one instance are undefined. The login frame is sent
    /// immediately on open and is the whole handshake: no server
    /// acknowledgment is awaited before frames flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the dial or the login send fails; the state
    /// is `Closed` afterwards and a later `connect` may retry.
    pub async fn connect(&self, username: &str) -> Result<(), ClientError> {
        self.disconnect().await;

        self.state.store(ConnectionState::Connecting);
        let url = self.endpoint.url();
        debug!(%url, user = %username, "Dialing chat server");

        let (stream, _response) = match connect_async(url.as_str()).await {
            Ok(ok) => ok,
            Err(e) => {
                self.state.store(ConnectionState::Closed);
                return Err(ClientError::Dial(e));
            }
        };

        let (mut ws_sink, ws_source) = stream.split();
        let login = Outbound::login(username).encode();
        if let Err(e) = ws_sink.send(Message::Text(login)).await {
            self.state.store(ConnectionState::Closed);
            return Err(ClientError::Dial(e));
        }

        *self.sink.lock().await = Some(ws_sink);
        self.state.store(ConnectionState::Open);
        debug!(user = %username, "Session open");

        let dispatcher = self.dispatcher.clone();
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(run_pump(ws_source, dispatcher, state));
        *self.pump.lock().unwrap() = Some(handle);

        Ok(())
    }

    /// Transmit a chat-send frame with `text`, if the transport is
    /// open. Fire-and-forget: while not open the message is dropped
    /// with no queueing and no error.
    pub async fn send(&self, text: &str) {
        self.transmit(Outbound::chat(text)).await;
    }

    /// Transmit a logout frame, with the same drop-if-not-open policy
    /// as [`SessionConnection::send`].
    pub async fn send_logout(&self) {
        self.transmit(Outbound::Logout).await;
    }

    /// Close the transport if present and clear it. Idempotent; safe
    /// when already closed or never opened.
    pub async fn disconnect(&self) {
        let handle = self.pump.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
        }

        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let _ = sink.close().await;
            debug!("Transport closed");
        }
        self.state.store(ConnectionState::Closed);
    }

    async fn transmit(&self, frame: Outbound) {
        if self.state.load() != ConnectionState::Open {
            trace!(?frame, "Dropping send while transport not open");
            return;
        }

        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return;
        };
        if let Err(e) = sink.send(Message::Text(frame.encode())).await {
            // Best-effort policy: log, mark the session closed, and
            // leave recovery to a caller-initiated reconnect.
            warn!(error = %e, "Send failed; session now closed");
            self.state.store(ConnectionState::Closed);
        }
    }
}

#[async_trait]
impl OutboundSink for SessionConnection {
    async fn send_chat(&self, content: &str) {
        self.send(content).await;
    }

    async fn send_logout(&self) {
        SessionConnection::send_logout(self).await;
    }

    async fn disconnect(&self) {
        SessionConnection::disconnect(self).await;
    }
}

/// Inbound pump: classify each text frame and hand it to the
/// dispatcher. Runs until the transport closes or errors; neither is
/// retried.
async fn run_pump(mut source: WsSource, dispatcher: Dispatcher, state: Arc<StateCell>) {
    while let Some(item) = source.next().await {
        match item {
            Ok(Message::Text(text)) => {
                dispatcher.dispatch(classify(&text));
            }
            Ok(Message::Binary(_)) => {
                // The protocol is text frames only.
                trace!("Ignoring binary frame");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Ok(Message::Close(_)) => {
                debug!("Server closed the connection");
                break;
            }
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                break;
            }
            Err(e) => {
                debug!(error = %e, "Transport error; session now closed");
                break;
            }
        }
    }
    state.store(ConnectionState::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_conversion() {
        for state in [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ] {
            assert_eq!(ConnectionState::try_from(u8::from(state)), Ok(state));
        }
        assert!(ConnectionState::try_from(4).is_err());
    }

    #[tokio::test]
    async fn test_new_connection_starts_idle() {
        let connection = SessionConnection::new(Endpoint::default(), Dispatcher::new());
        assert_eq!(connection.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_send_before_connect_is_a_no_op() {
        let connection = SessionConnection::new(Endpoint::default(), Dispatcher::new());
        connection.send("dropped").await;
        connection.send_logout().await;
        assert_eq!(connection.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_safe() {
        let connection = SessionConnection::new(Endpoint::default(), Dispatcher::new());
        connection.disconnect().await;
        connection.disconnect().await;
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
