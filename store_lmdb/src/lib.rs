//! LMDB persistence backend for the Strata node.
//!
//! Implements [`strata_store::Persistence`] on top of a single named `heed`
//! database. Every batch is one LMDB write transaction, so a block commit is
//! either fully durable or absent after a crash.

pub mod environment;
pub mod error;
pub mod persistence;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use persistence::LmdbPersistence;
