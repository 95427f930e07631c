//! Dwell-time scheduler.
//!
//! A node cannot know it has seen every transaction stamped at or before
//! `T` until enough time has passed for peers' copies to arrive. The
//! scheduler therefore only releases the queue's oldest entry once its
//! physical timestamp is at least `processing_delay` in the past, and never
//! looks past the oldest entry: a younger transaction that happens to be
//! "ready" still waits behind an older one that is not.

use std::time::Duration;

use crate::queue::{MainProcessingQueue, QueueEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Queue empty or oldest entry not yet aged.
    Idle,
    /// Oldest entry has aged and may be taken.
    Ready,
    /// An entry was handed out and has not been reported finished.
    Executing,
}

#[derive(Debug)]
pub enum Poll {
    Empty,
    /// The oldest entry becomes ready after `remaining`.
    Waiting { remaining: Duration },
    Ready(QueueEntry),
}

pub struct OrderingScheduler {
    delay_ns: u64,
    state: SchedulerState,
}

impl OrderingScheduler {
    pub fn new(processing_delay: Duration) -> Self {
        Self {
            delay_ns: u64::try_from(processing_delay.as_nanos()).unwrap_or(u64::MAX),
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_nanos(self.delay_ns)
    }

    /// Physical time at which an entry stamped at `physical_ns` may run.
    pub fn ready_at(&self, physical_ns: u64) -> u64 {
        physical_ns.saturating_add(self.delay_ns)
    }

    /// Time until the oldest entry is ready, without taking it.
    ///
    /// `None` when the queue is empty; zero when it is ready now.
    pub fn time_until_ready(&self, queue: &MainProcessingQueue, now_ns: u64) -> Option<Duration> {
        let oldest = queue.peek_oldest()?;
        let ready_at = self.ready_at(oldest.hlc().physical_ns);
        Some(Duration::from_nanos(ready_at.saturating_sub(now_ns)))
    }

    /// Take the oldest entry if it has aged.
    ///
    /// Must not be called while an entry is executing; call
    /// [`finish`](Self::finish) first.
    pub fn poll(&mut self, queue: &mut MainProcessingQueue, now_ns: u64) -> Poll {
        debug_assert_ne!(self.state, SchedulerState::Executing);
        let Some(remaining) = self.time_until_ready(queue, now_ns) else {
            self.state = SchedulerState::Idle;
            return Poll::Empty;
        };
        if !remaining.is_zero() {
            self.state = SchedulerState::Idle;
            return Poll::Waiting { remaining };
        }

        self.state = SchedulerState::Ready;
        match queue.pop_oldest() {
            Some(entry) => {
                self.state = SchedulerState::Executing;
                Poll::Ready(entry)
            }
            None => {
                self.state = SchedulerState::Idle;
                Poll::Empty
            }
        }
    }

    /// The entry handed out by the last [`poll`](Self::poll) has been executed.
    pub fn finish(&mut self) {
        self.state = SchedulerState::Idle;
    }
}
