//! Physical time sources.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of physical time in nanoseconds since the Unix epoch.
///
/// May go backwards (NTP steps); the HLC absorbs that.
pub trait PhysicalClock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// The operating-system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl PhysicalClock for SystemClock {
    fn now_ns(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ns() > 1_577_836_800_000_000_000);
    }
}
