//! Nullable transport: records what is sent, delivers what the test injects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use strata_network::{ReceiveCallback, Transport, TransportError};

#[derive(Clone, Default)]
pub struct NullTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    callbacks: Arc<RwLock<Vec<ReceiveCallback>>>,
    fail_sends: Arc<AtomicBool>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message broadcast so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        match self.sent.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Remove and return everything broadcast so far.
    pub fn drain_sent(&self) -> Vec<Vec<u8>> {
        match self.sent.lock() {
            Ok(mut s) => std::mem::take(&mut *s),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Simulate an inbound message from a peer.
    pub fn deliver(&self, bytes: Vec<u8>) {
        let callbacks = match self.callbacks.read() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        for callback in callbacks.iter() {
            callback(bytes.clone());
        }
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl Transport for NullTransport {
    fn broadcast(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("injected send failure".into()));
        }
        match self.sent.lock() {
            Ok(mut s) => s.push(bytes),
            Err(poisoned) => poisoned.into_inner().push(bytes),
        }
        Ok(())
    }

    fn on_receive(&self, callback: ReceiveCallback) {
        match self.callbacks.write() {
            Ok(mut c) => c.push(callback),
            Err(poisoned) => poisoned.into_inner().push(callback),
        }
    }
}
