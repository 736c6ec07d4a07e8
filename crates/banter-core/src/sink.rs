//! Outbound seam between the view-model and the transport.

use async_trait::async_trait;

/// The outbound operations a chat session needs from its connection.
///
/// Every method is fire-and-forget: implementations transmit only while
/// the transport is open and otherwise drop the request silently, never
/// returning an error to the caller.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Transmit a chat-send frame with the given content.
    async fn send_chat(&self, content: &str);

    /// Transmit a logout frame.
    async fn send_logout(&self);

    /// Close the transport if present. Idempotent.
    async fn disconnect(&self);
}
