//! Online-user roster state.
//!
//! The server delivers the roster as a full snapshot; each inbound
//! snapshot supersedes the prior set entirely. No merge logic exists.

use banter_protocol::RosterEntry;
use tracing::debug;

/// The set of users currently considered online.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale with a new snapshot.
    pub fn replace(&mut self, entries: Vec<RosterEntry>) {
        debug!(users = entries.len(), "Roster replaced");
        self.entries = entries;
    }

    /// Number of online users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Check whether a user is in the current snapshot.
    #[must_use]
    pub fn is_online(&self, username: &str) -> bool {
        self.entries.iter().any(|e| e.username == username)
    }

    /// Entries of the current snapshot, in server order.
    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Clone the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RosterEntry> {
        self.entries.clone()
    }

    /// Check if nobody is online.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
