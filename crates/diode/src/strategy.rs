//! Consumption strategies: how the pump waits when the ring is empty.
//!
//! The poller trades CPU for a bounded detection latency; the waiter parks
//! the thread and is woken by publishes, trading a small wake latency for
//! near-zero idle cost. Selection is by poll interval: strictly positive
//! picks the poller, zero picks the waiter.

use crate::ring::{Consumer, Step};
use crossbeam::sync::Parker;
use crossbeam::utils::Backoff;
use std::thread;
use std::time::Duration;

pub(crate) enum Strategy {
    Poller(Poller),
    Waiter(Waiter),
}

impl Strategy {
    /// Block until a record is available or the ring reaches its terminal
    /// state. `None` is terminal: the pump must exit.
    pub(crate) fn next(&mut self) -> Option<Vec<u8>> {
        match self {
            Self::Poller(poller) => poller.next(),
            Self::Waiter(waiter) => waiter.next(),
        }
    }
}

/// Checks the ring on a fixed wall-clock interval.
pub(crate) struct Poller {
    consumer: Consumer,
    interval: Duration,
}

impl Poller {
    pub(crate) fn new(consumer: Consumer, interval: Duration) -> Self {
        debug_assert!(!interval.is_zero());
        Self { consumer, interval }
    }

    fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            // Cancellation is observed by `step` on both sides of the sleep,
            // so shutdown waits at most one interval.
            match self.consumer.step() {
                Step::Record(payload) => return Some(payload),
                Step::Done => return None,
                Step::Idle => thread::sleep(self.interval),
            }
        }
    }
}

/// Parks until signaled by a publish or by cancellation.
pub(crate) struct Waiter {
    consumer: Consumer,
    parker: Parker,
}

impl Waiter {
    pub(crate) fn new(consumer: Consumer, parker: Parker) -> Self {
        Self { consumer, parker }
    }

    fn next(&mut self) -> Option<Vec<u8>> {
        // Short spin phase first: bursts usually refill the ring within a few
        // iterations, and parking would eat the wake latency every time.
        let backoff = Backoff::new();
        loop {
            match self.consumer.step() {
                Step::Record(payload) => return Some(payload),
                Step::Done => return None,
                Step::Idle => {
                    if backoff.is_completed() {
                        // Wake-ups may be spurious; the loop re-probes the
                        // ring rather than assuming data arrived.
                        self.parker.park();
                    } else {
                        backoff.snooze();
                    }
                }
            }
        }
    }
}
