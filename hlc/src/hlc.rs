//! The hybrid logical clock state machine.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use strata_types::{HlcTimestamp, NodeId};

use crate::clock::PhysicalClock;
use crate::error::HlcError;

/// Hybrid logical clock owned by one node.
///
/// Not internally synchronised: the node's ordering task owns it and all
/// stamping goes through that task.
pub struct HybridLogicalClock {
    clock: Arc<dyn PhysicalClock>,
    node: NodeId,
    last_physical: u64,
    last_logical: u32,
    max_drift: Option<Duration>,
}

impl HybridLogicalClock {
    pub fn new(clock: Arc<dyn PhysicalClock>, node: NodeId) -> Self {
        Self {
            clock,
            node,
            last_physical: 0,
            last_logical: 0,
            max_drift: None,
        }
    }

    /// Refuse remote timestamps further than `max_drift` ahead of local time.
    pub fn with_max_drift(mut self, max_drift: Duration) -> Self {
        self.max_drift = Some(max_drift);
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Current reading of the underlying physical clock.
    pub fn physical_now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    /// The most recent timestamp issued or merged.
    pub fn last(&self) -> HlcTimestamp {
        HlcTimestamp::new(self.last_physical, self.last_logical, self.node)
    }

    /// Issue a timestamp strictly greater than every one issued or observed so far.
    pub fn new_timestamp(&mut self) -> HlcTimestamp {
        let now = self.clock.now_ns();
        let (physical, logical) = if now > self.last_physical {
            (now, 0)
        } else {
            if now < self.last_physical {
                tracing::trace!(
                    now,
                    last = self.last_physical,
                    "physical clock behind HLC, advancing logical counter"
                );
            }
            successor(self.last_physical, self.last_logical)
        };
        self.last_physical = physical;
        self.last_logical = logical;
        self.last()
    }

    /// Merge a timestamp received from another node.
    ///
    /// Afterwards every timestamp this clock issues compares greater than
    /// `remote`. A remote timestamp too far in the future is refused and not
    /// merged.
    pub fn observe(&mut self, remote: &HlcTimestamp) -> Result<(), HlcError> {
        let now = self.clock.now_ns();
        if let Some(max_drift) = self.max_drift {
            let max_drift_ns = max_drift.as_nanos() as u64;
            if remote.physical_ns > now.saturating_add(max_drift_ns) {
                return Err(HlcError::DriftExceeded {
                    remote_ns: remote.physical_ns,
                    local_ns: now,
                    max_drift_ns,
                });
            }
        }

        let max_physical = now.max(self.last_physical).max(remote.physical_ns);
        let local_tied = max_physical == self.last_physical;
        let remote_tied = max_physical == remote.physical_ns;

        let (physical, logical) = match (local_tied, remote_tied) {
            (true, true) => successor(max_physical, self.last_logical.max(remote.logical)),
            (true, false) => successor(self.last_physical, self.last_logical),
            (false, true) => successor(remote.physical_ns, remote.logical),
            (false, false) => (now, 0),
        };
        self.last_physical = physical;
        self.last_logical = logical;
        Ok(())
    }

    /// Total order across nodes: physical, then logical, then node id.
    pub fn compare(a: &HlcTimestamp, b: &HlcTimestamp) -> Ordering {
        a.cmp(b)
    }

    /// Physical time elapsed since `ts` was issued; zero if `ts` is in the future.
    pub fn age(&self, ts: &HlcTimestamp) -> Duration {
        Duration::from_nanos(self.clock.now_ns().saturating_sub(ts.physical_ns))
    }
}

/// The next clock reading after `(physical, logical)`.
///
/// An exhausted logical counter carries into the physical component rather
/// than wrapping.
fn successor(physical: u64, logical: u32) -> (u64, u32) {
    match logical.checked_add(1) {
        Some(next) => (physical, next),
        None => (physical.saturating_add(1), 0),
    }
}
