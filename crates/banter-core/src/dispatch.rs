//! Event fan-out for decoded inbound payloads.
//!
//! The dispatcher keeps two independent listener lists, one for chat
//! messages and one for roster snapshots, so unrelated consumers (the
//! history accumulator, a transient notification popup) can subscribe
//! without interfering with each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use banter_protocol::{ChatMessage, Inbound, RosterEntry};
use tracing::trace;

type MessageListener = Arc<dyn Fn(&ChatMessage) + Send + Sync>;
type RosterListener = Arc<dyn Fn(&[RosterEntry]) + Send + Sync>;

/// Fan-out registry for decoded inbound events.
///
/// Cloning a `Dispatcher` yields another handle to the same listener
/// lists. Dispatch is synchronous with respect to decode: all listeners
/// for a frame run before the next frame is classified, in registration
/// order.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    messages: Mutex<Vec<(u64, MessageListener)>>,
    rosters: Mutex<Vec<(u64, RosterListener)>>,
}

/// Which listener list a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerKind {
    Message,
    Roster,
}

/// Handle bound to one registered listener.
///
/// [`Subscription::cancel`] removes exactly that listener and is
/// idempotent. Dropping the handle without cancelling leaves the
/// listener registered for the life of the dispatcher.
pub struct Subscription {
    inner: Arc<Inner>,
    kind: ListenerKind,
    id: u64,
}

impl Subscription {
    /// Remove the listener this handle is bound to.
    ///
    /// Safe to call more than once; later calls find nothing to remove.
    /// A cancel taking effect during an in-progress dispatch does not
    /// retract deliveries already snapshotted for that frame.
    pub fn cancel(&self) {
        let removed = match self.kind {
            ListenerKind::Message => {
                let mut listeners = self.inner.messages.lock().unwrap();
                let before = listeners.len();
                listeners.retain(|(id, _)| *id != self.id);
                before != listeners.len()
            }
            ListenerKind::Roster => {
                let mut listeners = self.inner.rosters.lock().unwrap();
                let before = listeners.len();
                listeners.retain(|(id, _)| *id != self.id);
                before != listeners.len()
            }
        };
        if removed {
            trace!(id = self.id, kind = ?self.kind, "Listener unsubscribed");
        }
    }
}

impl Dispatcher {
    /// Create a new dispatcher with empty listener lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for decoded chat messages.
    pub fn subscribe_messages<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .messages
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: ListenerKind::Message,
            id,
        }
    }

    /// Register a listener for roster snapshots.
    pub fn subscribe_roster<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[RosterEntry]) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .rosters
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: ListenerKind::Roster,
            id,
        }
    }

    /// Deliver one classified payload to the matching listener list.
    ///
    /// `Ignored` and `Malformed` dispatch nothing. The listener list is
    /// snapshotted at dispatch start, so subscriptions cancelled by a
    /// listener apply from the next frame on.
    pub fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::Message(message) => {
                let listeners: Vec<MessageListener> = {
                    let guard = self.inner.messages.lock().unwrap();
                    guard.iter().map(|(_, l)| Arc::clone(l)).collect()
                };
                trace!(
                    sender = %message.username,
                    listeners = listeners.len(),
                    "Dispatching chat message"
                );
                for listener in &listeners {
                    listener(&message);
                }
            }
            Inbound::Roster(entries) => {
                let listeners: Vec<RosterListener> = {
                    let guard = self.inner.rosters.lock().unwrap();
                    guard.iter().map(|(_, l)| Arc::clone(l)).collect()
                };
                trace!(
                    users = entries.len(),
                    listeners = listeners.len(),
                    "Dispatching roster snapshot"
                );
                for listener in &listeners {
                    listener(&entries);
                }
            }
            Inbound::Ignored | Inbound::Malformed => {
                trace!("Dropping non-dispatchable payload");
            }
        }
    }

    /// Number of registered chat-message listeners.
    #[must_use]
    pub fn message_listener_count(&self) -> usize {
        self.inner.messages.lock().unwrap().len()
    }

    /// Number of registered roster listeners.
    #[must_use]
    pub fn roster_listener_count(&self) -> usize {
        self.inner.rosters.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_protocol::Timestamp;

    fn message(username: &str, content: &str) -> Inbound {
        Inbound::Message(ChatMessage::new(username, content, Timestamp::from("t0")))
    }

    #[test]
    fn test_dispatch_reaches_every_message_listener_once() {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let _sub_a = dispatcher.subscribe_messages(move |m| {
            seen_a.lock().unwrap().push(format!("a:{}", m.content));
        });
        let seen_b = Arc::clone(&seen);
        let _sub_b = dispatcher.subscribe_messages(move |m| {
            seen_b.lock().unwrap().push(format!("b:{}", m.content));
        });

        dispatcher.dispatch(message("bob", "hi"));

        // Registration order, exactly once each.
        assert_eq!(*seen.lock().unwrap(), vec!["a:hi", "b:hi"]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let sub = dispatcher.subscribe_messages(|_| {});
        assert_eq!(dispatcher.message_listener_count(), 1);

        sub.cancel();
        assert_eq!(dispatcher.message_listener_count(), 0);
        sub.cancel();
        assert_eq!(dispatcher.message_listener_count(), 0);
    }

    #[test]
    fn test_cancel_removes_exactly_one_listener() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(Mutex::new(0u32));

        let hits_a = Arc::clone(&hits);
        let sub_a = dispatcher.subscribe_messages(move |_| {
            *hits_a.lock().unwrap() += 1;
        });
        let hits_b = Arc::clone(&hits);
        let _sub_b = dispatcher.subscribe_messages(move |_| {
            *hits_b.lock().unwrap() += 10;
        });

        sub_a.cancel();
        dispatcher.dispatch(message("bob", "hi"));
        assert_eq!(*hits.lock().unwrap(), 10);
    }

    #[test]
    fn test_listener_lists_are_independent() {
        let dispatcher = Dispatcher::new();
        let messages = Arc::new(Mutex::new(0u32));
        let rosters = Arc::new(Mutex::new(0u32));

        let m = Arc::clone(&messages);
        let _sub_m = dispatcher.subscribe_messages(move |_| *m.lock().unwrap() += 1);
        let r = Arc::clone(&rosters);
        let _sub_r = dispatcher.subscribe_roster(move |_| *r.lock().unwrap() += 1);

        dispatcher.dispatch(message("bob", "hi"));
        dispatcher.dispatch(Inbound::Roster(vec![]));

        assert_eq!(*messages.lock().unwrap(), 1);
        assert_eq!(*rosters.lock().unwrap(), 1);
    }

    #[test]
    fn test_ignored_and_malformed_dispatch_nothing() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(Mutex::new(0u32));

        let m = Arc::clone(&hits);
        let _sub_m = dispatcher.subscribe_messages(move |_| *m.lock().unwrap() += 1);
        let r = Arc::clone(&hits);
        let _sub_r = dispatcher.subscribe_roster(move |_| *r.lock().unwrap() += 1);

        dispatcher.dispatch(Inbound::Ignored);
        dispatcher.dispatch(Inbound::Malformed);
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_cancel_during_dispatch_applies_to_next_frame() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(Mutex::new(0u32));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let hits_self = Arc::clone(&hits);
        let slot_self = Arc::clone(&slot);
        let sub = dispatcher.subscribe_messages(move |_| {
            *hits_self.lock().unwrap() += 1;
            if let Some(sub) = slot_self.lock().unwrap().take() {
                sub.cancel();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        dispatcher.dispatch(message("bob", "one"));
        dispatcher.dispatch(message("bob", "two"));

        // Delivered once, then the self-cancel took effect.
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
