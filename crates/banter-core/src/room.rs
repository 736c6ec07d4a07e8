//! The chat view-model.
//!
//! A [`ChatRoom`] owns the externally visible state of one logged-in
//! session: the ordered message history and the current roster. It
//! subscribes to the dispatcher on construction and translates user
//! intent (submit, logout) into outbound frames through its
//! [`OutboundSink`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use banter_protocol::{ChatMessage, RosterEntry};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::dispatch::{Dispatcher, Subscription};
use crate::roster::Roster;
use crate::sink::OutboundSink;

/// Default flush grace before the transport is torn down on logout.
pub const DEFAULT_LOGOUT_GRACE: Duration = Duration::from_millis(100);

/// View-model tuning knobs.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long to wait after sending the logout frame before closing
    /// the transport. Best effort: the delay gives the frame a chance
    /// to flush on the wire, it does not guarantee delivery.
    pub logout_grace: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            logout_grace: DEFAULT_LOGOUT_GRACE,
        }
    }
}

/// Event emitted to the UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A message from someone other than the local user arrived.
    NewMessage {
        /// Sender display name.
        username: String,
        /// Message body.
        content: String,
    },
    /// The session has ended; the transport is closed.
    SessionEnded,
}

/// Reactive state for one active chat session.
///
/// The surrounding UI reads state through [`ChatRoom::history`] and
/// [`ChatRoom::roster`]; the room is the sole mutator.
pub struct ChatRoom {
    username: String,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    roster: Arc<Mutex<Roster>>,
    sink: Arc<dyn OutboundSink>,
    notices: UnboundedSender<Notice>,
    subscriptions: Mutex<Vec<Subscription>>,
    logout_grace: Duration,
}

impl ChatRoom {
    /// Create a room for `username` and attach it to the dispatcher.
    ///
    /// Returns the room and the receiving end of its notice stream.
    /// The room registers one message listener and one roster listener;
    /// both are removed again by [`ChatRoom::shutdown`].
    pub fn new(
        username: impl Into<String>,
        dispatcher: &Dispatcher,
        sink: Arc<dyn OutboundSink>,
        config: RoomConfig,
    ) -> (Self, UnboundedReceiver<Notice>) {
        let username = username.into();
        let history = Arc::new(Mutex::new(Vec::new()));
        let roster = Arc::new(Mutex::new(Roster::new()));
        let (notices, notice_rx) = mpsc::unbounded_channel();

        let history_sub = {
            let history = Arc::clone(&history);
            let notices = notices.clone();
            let local_user = username.clone();
            dispatcher.subscribe_messages(move |message: &ChatMessage| {
                history.lock().unwrap().push(message.clone());
                if message.username != local_user {
                    // Receiver may already be gone during teardown.
                    let _ = notices.send(Notice::NewMessage {
                        username: message.username.clone(),
                        content: message.content.clone(),
                    });
                }
            })
        };

        let roster_sub = {
            let roster = Arc::clone(&roster);
            dispatcher.subscribe_roster(move |entries: &[RosterEntry]| {
                roster.lock().unwrap().replace(entries.to_vec());
            })
        };

        debug!(user = %username, "Chat room attached");

        let room = Self {
            username,
            history,
            roster,
            sink,
            notices,
            subscriptions: Mutex::new(vec![history_sub, roster_sub]),
            logout_grace: config.logout_grace,
        };
        (room, notice_rx)
    }

    /// The local user's display name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Snapshot of the message history, in arrival order.
    #[must_use]
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().unwrap().clone()
    }

    /// Snapshot of the current roster.
    #[must_use]
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.roster.lock().unwrap().snapshot()
    }

    /// Submit composed text.
    ///
    /// Whitespace-only input is a no-op; otherwise exactly one
    /// chat-send frame with the trimmed text is forwarded to the
    /// connection (fire-and-forget).
    pub async fn submit(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            trace!("Ignoring empty submit");
            return;
        }
        self.sink.send_chat(trimmed).await;
    }

    /// Log out of the session.
    ///
    /// Sends the logout frame, waits the configured flush grace, then
    /// tears the session down and emits [`Notice::SessionEnded`].
    /// Closing immediately after the send would race the frame being
    /// flushed, so the grace is deliberate; it is still best effort.
    pub async fn logout(&self) {
        debug!(user = %self.username, "Logging out");
        self.sink.send_logout().await;
        tokio::time::sleep(self.logout_grace).await;
        self.shutdown().await;
        let _ = self.notices.send(Notice::SessionEnded);
    }

    /// Tear the session down: cancel both dispatcher subscriptions,
    /// then disconnect the transport, in that order, so no dispatched
    /// event can arrive after state teardown has begun. Idempotent.
    pub async fn shutdown(&self) {
        let subscriptions: Vec<Subscription> =
            self.subscriptions.lock().unwrap().drain(..).collect();
        for subscription in &subscriptions {
            subscription.cancel();
        }
        self.sink.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use banter_protocol::{Inbound, Timestamp};

    #[derive(Default)]
    struct RecordingSink {
        ops: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn ops(&self) -> Vec<String> {
            self.ops.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundSink for RecordingSink {
        async fn send_chat(&self, content: &str) {
            self.ops.lock().unwrap().push(format!("chat:{}", content));
        }

        async fn send_logout(&self) {
            self.ops.lock().unwrap().push("logout".to_string());
        }

        async fn disconnect(&self) {
            self.ops.lock().unwrap().push("disconnect".to_string());
        }
    }

    fn room_with_sink(
        username: &str,
        dispatcher: &Dispatcher,
    ) -> (ChatRoom, UnboundedReceiver<Notice>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let config = RoomConfig {
            logout_grace: Duration::from_millis(0),
        };
        let sink_dyn: Arc<dyn OutboundSink> = Arc::clone(&sink) as Arc<dyn OutboundSink>;
        let (room, notices) = ChatRoom::new(username, dispatcher, sink_dyn, config);
        (room, notices, sink)
    }

    fn broadcast(username: &str, content: &str, timestamp: &str) -> Inbound {
        Inbound::Message(ChatMessage::new(
            username,
            content,
            Timestamp::from(timestamp),
        ))
    }

    #[tokio::test]
    async fn test_submit_trims_and_gates() {
        let dispatcher = Dispatcher::new();
        let (room, _notices, sink) = room_with_sink("alice", &dispatcher);

        room.submit("").await;
        room.submit("   ").await;
        assert!(sink.ops().is_empty());

        room.submit("  hello  ").await;
        assert_eq!(sink.ops(), vec!["chat:hello"]);
    }

    #[tokio::test]
    async fn test_history_appends_in_arrival_order() {
        let dispatcher = Dispatcher::new();
        let (room, _notices, _sink) = room_with_sink("alice", &dispatcher);

        dispatcher.dispatch(broadcast("bob", "first", "t1"));
        dispatcher.dispatch(broadcast("alice", "second", "t0"));
        dispatcher.dispatch(broadcast("bob", "first", "t1")); // duplicate kept

        let history = room.history();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_notice_fires_for_non_local_sender_only() {
        let dispatcher = Dispatcher::new();
        let (_room, mut notices, _sink) = room_with_sink("alice", &dispatcher);

        dispatcher.dispatch(broadcast("alice", "mine", "t0"));
        dispatcher.dispatch(broadcast("bob", "hi", "t1"));

        assert_eq!(
            notices.try_recv().ok(),
            Some(Notice::NewMessage {
                username: "bob".to_string(),
                content: "hi".to_string(),
            })
        );
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_roster_snapshot_replaces_wholesale() {
        let dispatcher = Dispatcher::new();
        let (room, _notices, _sink) = room_with_sink("alice", &dispatcher);

        dispatcher.dispatch(Inbound::Roster(vec![
            RosterEntry::new("alice", "t0"),
            RosterEntry::new("bob", "t0"),
        ]));
        dispatcher.dispatch(Inbound::Roster(vec![RosterEntry::new("bob", "t1")]));

        let roster = room.roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].username, "bob");
    }

    #[tokio::test]
    async fn test_logout_sends_frame_then_disconnects_and_notifies() {
        let dispatcher = Dispatcher::new();
        let (room, mut notices, sink) = room_with_sink("alice", &dispatcher);

        room.logout().await;

        assert_eq!(sink.ops(), vec!["logout", "disconnect"]);
        assert_eq!(notices.try_recv().ok(), Some(Notice::SessionEnded));
        assert_eq!(dispatcher.message_listener_count(), 0);
        assert_eq!(dispatcher.roster_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_state_updates() {
        let dispatcher = Dispatcher::new();
        let (room, _notices, sink) = room_with_sink("alice", &dispatcher);

        room.shutdown().await;
        dispatcher.dispatch(broadcast("bob", "late", "t9"));

        assert!(room.history().is_empty());
        assert_eq!(sink.ops(), vec!["disconnect"]);

        // Idempotent.
        room.shutdown().await;
        assert_eq!(sink.ops(), vec!["disconnect", "disconnect"]);
    }
}
