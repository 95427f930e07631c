//! Hybrid logical clock.
//!
//! Every transaction is stamped once, by the first node that accepts it, with
//! a timestamp from this clock. Timestamps combine the node's physical clock
//! with a logical counter so that:
//!
//! - timestamps issued by one node strictly increase, even if the wall clock
//!   steps backwards;
//! - a node that has seen a remote timestamp only issues larger ones after it;
//! - timestamps from different nodes are totally ordered (node id breaks ties).

pub mod clock;
pub mod error;
pub mod hlc;

pub use clock::{PhysicalClock, SystemClock};
pub use error::HlcError;
pub use hlc::HybridLogicalClock;
