//! Nullable signer: a real Ed25519 key that can be told to refuse.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strata_crypto::{Ed25519Signer, SignError, Signer};
use strata_types::{PublicKey, Signature};

#[derive(Clone)]
pub struct NullSigner {
    inner: Arc<Ed25519Signer>,
    failing: Arc<AtomicBool>,
}

impl NullSigner {
    /// Deterministic key from a one-byte seed.
    pub fn from_seed_byte(seed: u8) -> Self {
        Self {
            inner: Arc::new(Ed25519Signer::from_seed(&[seed; 32])),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While set, every `sign` call fails with [`SignError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Signer for NullSigner {
    fn public_key(&self) -> PublicKey {
        self.inner.public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SignError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SignError::Unavailable("signer disabled".into()));
        }
        self.inner.sign(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_crypto::{Ed25519Verifier, Verifier};

    #[test]
    fn toggles_failure() {
        let signer = NullSigner::from_seed_byte(4);
        let sig = signer.sign(b"m").unwrap();
        assert!(Ed25519Verifier.verify(&signer.public_key(), b"m", &sig));

        signer.set_failing(true);
        assert!(matches!(signer.sign(b"m"), Err(SignError::Unavailable(_))));
    }
}
