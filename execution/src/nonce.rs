//! Per-sender replay guard.

use std::collections::BTreeMap;

use strata_ledger::NonceError;
use strata_store::keys::{decode_u64, nonce_key};
use strata_store::{StateView, StoreError};
use strata_types::PublicKey;

/// Tracks nonces accepted in the block being built.
///
/// The committed nonce of each sender lives in the state store. Accepted
/// nonces are held here as pending until the block commits; the block
/// builder stages them with [`NonceGuard::take_pending`] or drops them with
/// [`NonceGuard::clear`] when the block is abandoned.
#[derive(Debug, Default)]
pub struct NonceGuard {
    pending: BTreeMap<PublicKey, u64>,
    /// Pending value each sender had before its latest advance.
    previous: BTreeMap<PublicKey, Option<u64>>,
}

impl NonceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest nonce accepted for `sender`: pending first, then committed.
    pub fn last_nonce(&self, view: &dyn StateView, sender: &PublicKey) -> Result<Option<u64>, StoreError> {
        if let Some(n) = self.pending.get(sender) {
            return Ok(Some(*n));
        }
        view.get(&nonce_key(sender))?
            .map(|b| decode_u64(&b))
            .transpose()
    }

    /// Accept `nonce` if it is strictly greater than the last accepted one.
    ///
    /// The outer `Result` is a storage failure; the inner one is the
    /// deterministic verdict.
    pub fn validate_and_advance(
        &mut self,
        view: &dyn StateView,
        sender: &PublicKey,
        nonce: u64,
    ) -> Result<Result<(), NonceError>, StoreError> {
        let last = self.last_nonce(view, sender)?;
        if let Some(last) = last {
            if nonce <= last {
                return Ok(Err(NonceError::TooLow { last, got: nonce }));
            }
        }
        let before = self.pending.insert(*sender, nonce);
        self.previous.insert(*sender, before);
        Ok(Ok(()))
    }

    /// Undo the most recent advance for `sender`.
    pub fn rollback(&mut self, sender: &PublicKey) {
        match self.previous.remove(sender) {
            Some(Some(before)) => {
                self.pending.insert(*sender, before);
            }
            Some(None) => {
                self.pending.remove(sender);
            }
            None => {}
        }
    }

    /// Drain pending nonces for staging alongside the block's deltas.
    pub fn take_pending(&mut self) -> Vec<(PublicKey, u64)> {
        self.previous.clear();
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Forget everything pending; used when a block is abandoned.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.previous.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::keys::encode_u64;

    fn sender() -> PublicKey {
        PublicKey([3u8; 32])
    }

    fn committed(n: u64) -> BTreeMap<String, Vec<u8>> {
        let mut state = BTreeMap::new();
        state.insert(nonce_key(&sender()), encode_u64(n));
        state
    }

    #[test]
    fn replay_of_committed_nonce_rejected() {
        let state = committed(5);
        let mut guard = NonceGuard::new();
        assert_eq!(
            guard.validate_and_advance(&state, &sender(), 5).unwrap(),
            Err(NonceError::TooLow { last: 5, got: 5 })
        );
        assert_eq!(guard.validate_and_advance(&state, &sender(), 6).unwrap(), Ok(()));
    }

    #[test]
    fn higher_nonce_first_blocks_lower() {
        let state: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut guard = NonceGuard::new();
        assert_eq!(guard.validate_and_advance(&state, &sender(), 2).unwrap(), Ok(()));
        assert!(guard.validate_and_advance(&state, &sender(), 1).unwrap().is_err());
    }

    #[test]
    fn gaps_allowed() {
        let state = committed(1);
        let mut guard = NonceGuard::new();
        assert_eq!(guard.validate_and_advance(&state, &sender(), 10).unwrap(), Ok(()));
        assert_eq!(guard.last_nonce(&state, &sender()).unwrap(), Some(10));
    }

    #[test]
    fn rollback_restores_previous_pending() {
        let state = committed(1);
        let mut guard = NonceGuard::new();
        guard.validate_and_advance(&state, &sender(), 2).unwrap().unwrap();
        guard.validate_and_advance(&state, &sender(), 3).unwrap().unwrap();
        guard.rollback(&sender());
        assert_eq!(guard.last_nonce(&state, &sender()).unwrap(), Some(2));
    }

    #[test]
    fn rollback_of_first_advance_falls_back_to_committed() {
        let state = committed(1);
        let mut guard = NonceGuard::new();
        guard.validate_and_advance(&state, &sender(), 2).unwrap().unwrap();
        guard.rollback(&sender());
        assert_eq!(guard.last_nonce(&state, &sender()).unwrap(), Some(1));
        assert_eq!(guard.pending_len(), 0);
    }

    #[test]
    fn take_pending_drains() {
        let state: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut guard = NonceGuard::new();
        guard.validate_and_advance(&state, &sender(), 7).unwrap().unwrap();
        assert_eq!(guard.take_pending(), vec![(sender(), 7)]);
        assert_eq!(guard.pending_len(), 0);
    }
}
