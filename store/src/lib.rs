//! State and metadata storage for the Strata node.
//!
//! Backends implement the narrow [`Persistence`] trait (get, set, atomic
//! batch). Everything above it goes through [`StateStore`], which buffers a
//! block's writes in a staging overlay and flushes them, together with the
//! chain metadata, in a single batch.

pub mod chain;
pub mod error;
pub mod keys;
pub mod persistence;
pub mod state;
pub mod view;

pub use chain::{BlockCommit, ChainHead, EpochInfo};
pub use error::StoreError;
pub use persistence::{Persistence, WriteOp};
pub use state::StateStore;
pub use view::StateView;
