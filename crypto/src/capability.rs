//! Signing and verification capabilities.
//!
//! The ordering pipeline only ever sees these traits: the node's key may live
//! in process memory, in an HSM, or behind a test double.

use strata_types::{KeyPair, PublicKey, Signature};

use crate::error::SignError;
use crate::sign::{sign_message, verify_signature};

/// Something that can sign on behalf of one identity.
pub trait Signer: Send + Sync {
    /// Identity whose signatures this signer produces.
    fn public_key(&self) -> PublicKey;

    fn sign(&self, message: &[u8]) -> Result<Signature, SignError>;
}

/// Something that can check signatures for any identity.
pub trait Verifier: Send + Sync {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

/// In-process Ed25519 signer.
pub struct Ed25519Signer {
    keypair: KeyPair,
}

impl Ed25519Signer {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Deterministic signer for a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(crate::keys::keypair_from_seed(seed))
    }
}

impl Signer for Ed25519Signer {
    fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SignError> {
        Ok(sign_message(message, &self.keypair.private))
    }
}

/// Stateless Ed25519 verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl Verifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        verify_signature(message, signature, public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_output_verifies() {
        let signer = Ed25519Signer::from_seed(&[5u8; 32]);
        let sig = signer.sign(b"block").unwrap();
        assert!(Ed25519Verifier.verify(&signer.public_key(), b"block", &sig));
        assert!(!Ed25519Verifier.verify(&signer.public_key(), b"other", &sig));
    }

    #[test]
    fn signer_is_object_safe() {
        let signer: Box<dyn Signer> = Box::new(Ed25519Signer::from_seed(&[6u8; 32]));
        let verifier: Box<dyn Verifier> = Box::new(Ed25519Verifier);
        let sig = signer.sign(b"x").unwrap();
        assert!(verifier.verify(&signer.public_key(), b"x", &sig));
    }
}
