use crate::error::TransportError;

/// Callback invoked with the raw bytes of every inbound message.
pub type ReceiveCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// Fire-and-forget message transport to every peer.
pub trait Transport: Send + Sync {
    /// Queue `bytes` for delivery to all peers. Must not block.
    fn broadcast(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Register a callback for inbound messages.
    fn on_receive(&self, callback: ReceiveCallback);
}
