//! In-process transport over tokio channels.
//!
//! A [`ChannelTransport`] does not deliver anything itself: `broadcast`
//! pushes bytes onto an `mpsc` channel that the owner of the receiving half
//! drains. [`ChannelHub`] owns those receivers and forwards every message to
//! all other endpoints.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::transport::{ReceiveCallback, Transport};

#[derive(Clone)]
pub struct ChannelTransport {
    outbound_tx: mpsc::Sender<Vec<u8>>,
    callbacks: Arc<RwLock<Vec<ReceiveCallback>>>,
}

impl ChannelTransport {
    /// A transport whose outbound messages land on `outbound_tx`.
    pub fn new(outbound_tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            outbound_tx,
            callbacks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Hand inbound bytes to every registered callback.
    pub fn deliver(&self, bytes: Vec<u8>) {
        let callbacks = match self.callbacks.read() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        for callback in callbacks.iter() {
            callback(bytes.clone());
        }
    }
}

impl Transport for ChannelTransport {
    fn broadcast(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.outbound_tx.try_send(bytes).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    fn on_receive(&self, callback: ReceiveCallback) {
        match self.callbacks.write() {
            Ok(mut c) => c.push(callback),
            Err(poisoned) => poisoned.into_inner().push(callback),
        }
    }
}

/// Connects any number of [`ChannelTransport`]s; each broadcast reaches
/// every other endpoint.
#[derive(Clone, Default)]
pub struct ChannelHub {
    endpoints: Arc<Mutex<Vec<ChannelTransport>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint. Spawns the task forwarding its outbound messages,
    /// so this must run inside a tokio runtime.
    pub fn connect(&self, capacity: usize) -> ChannelTransport {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(capacity);
        let transport = ChannelTransport::new(tx);
        let index = {
            let mut endpoints = match self.endpoints.lock() {
                Ok(e) => e,
                Err(poisoned) => poisoned.into_inner(),
            };
            endpoints.push(transport.clone());
            endpoints.len() - 1
        };

        let endpoints = Arc::clone(&self.endpoints);
        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                let peers: Vec<ChannelTransport> = match endpoints.lock() {
                    Ok(e) => e.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };
                for (i, peer) in peers.iter().enumerate() {
                    if i != index {
                        peer.deliver(bytes.clone());
                    }
                }
            }
            tracing::debug!(endpoint = index, "channel endpoint closed");
        });
        transport
    }

    pub fn len(&self) -> usize {
        match self.endpoints.lock() {
            Ok(e) => e.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
