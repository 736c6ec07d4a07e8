//! # banter-core
//!
//! Event dispatch and reactive session state for the Banter chat
//! client.
//!
//! This crate provides the pieces between the wire and the UI:
//!
//! - **Dispatcher** - typed listener lists fanning out decoded events
//! - **Roster** - full-replacement snapshot of online users
//! - **ChatRoom** - the view-model owning message history and roster
//! - **OutboundSink** - the trait seam the view-model sends through
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│  Dispatcher │────▶│  ChatRoom   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       │
//!        │            ┌─────────────┐            │
//!        └────────────│ OutboundSink│◀───────────┘
//!                     └─────────────┘
//! ```
//!
//! The UI collaborator reads `ChatRoom` state and receives `Notice`
//! events; the core is the sole mutator.

pub mod dispatch;
pub mod room;
pub mod roster;
pub mod sink;

pub use dispatch::{Dispatcher, Subscription};
pub use room::{ChatRoom, Notice, RoomConfig};
pub use roster::Roster;
pub use sink::OutboundSink;
