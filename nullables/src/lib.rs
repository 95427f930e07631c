//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the node (physical clock, persistence,
//! transport, signing key) sits behind a trait. The implementations here:
//! - return deterministic values
//! - can be controlled programmatically (advance time, fail the next commit,
//!   refuse to sign)
//! - never touch the filesystem or network
//!
//! Each nullable is a cheap `Clone` sharing its state, so a test keeps one
//! handle to steer it while the node owns another.

pub mod clock;
pub mod network;
pub mod signer;
pub mod store;

pub use clock::NullClock;
pub use network::NullTransport;
pub use signer::NullSigner;
pub use store::NullPersistence;
