//! Nullable clock: time only moves when the test moves it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use strata_hlc::PhysicalClock;

#[derive(Clone, Debug, Default)]
pub struct NullClock {
    now_ns: Arc<AtomicU64>,
}

impl NullClock {
    pub fn new(initial_ns: u64) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(initial_ns)),
        }
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let ns = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.now_ns.fetch_add(ns, Ordering::SeqCst);
    }

    /// Step backwards, as an NTP correction would.
    pub fn rewind(&self, by: Duration) {
        let ns = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let now = self.now_ns.load(Ordering::SeqCst);
        self.now_ns.store(now.saturating_sub(ns), Ordering::SeqCst);
    }
}

impl PhysicalClock for NullClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}
