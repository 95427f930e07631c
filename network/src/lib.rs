//! Peer fan-out for the Strata node.
//!
//! The node never talks to sockets. It hands encoded messages to a
//! [`Transport`] and registers a callback for inbound bytes. This crate
//! provides the seam, an in-process [`ChannelTransport`] (several nodes in
//! one process share a [`ChannelHub`]), and [`MessageDedup`] for dropping
//! messages that arrive more than once.

pub mod channel;
pub mod dedup;
pub mod error;
pub mod transport;

pub use channel::{ChannelHub, ChannelTransport};
pub use dedup::MessageDedup;
pub use error::TransportError;
pub use transport::{ReceiveCallback, Transport};
