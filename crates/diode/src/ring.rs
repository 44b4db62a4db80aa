//! Many-writer, single-reader overwrite ring.
//!
//! Any number of producers publish through a shared `&Ring`; exactly one
//! `Consumer` drains it. When producers outrun the consumer the ring
//! overwrites the oldest unread records and the consumer reports the loss
//! through the drop alert, so publishing never blocks and never fails.

use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU64, Ordering};

/// Callback invoked with the number of records lost to overwrite since the
/// previous invocation.
pub(crate) type DropAlert = Box<dyn Fn(u64) + Send + Sync>;

/// A payload tagged with the sequence it was published under. The tag is what
/// lets the consumer tell a fresh record from a leftover of an earlier lap.
struct Record {
    seq: u64,
    payload: Vec<u8>,
}

pub(crate) struct Ring {
    slots: Box<[AtomicPtr<Record>]>,
    /// Next sequence to hand out; incremented by every publisher.
    write: AtomicU64,
    closed: AtomicBool,
    alert: DropAlert,
}

/// Outcome of a single slot probe by the consumer.
pub(crate) enum Take {
    /// A record was read at `seq`; the reader resumes from `seq + 1`.
    Item { payload: Vec<u8>, seq: u64 },
    /// Nothing readable at the expected sequence yet.
    Empty,
}

impl Ring {
    pub(crate) fn new(capacity: usize, alert: DropAlert) -> Self {
        debug_assert!(capacity > 0, "capacity validated by the builder");
        let slots = (0..capacity)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();
        Self {
            slots,
            write: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            alert,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn write_cursor(&self) -> u64 {
        self.write.load(Ordering::Acquire)
    }

    pub(crate) fn alert(&self, missed: u64) {
        (self.alert)(missed);
    }

    /// Publish a payload: one `fetch_add` to claim a unique sequence, one
    /// `swap` to make payload and sequence visible as a unit.
    pub(crate) fn publish(&self, payload: Vec<u8>) {
        let seq = self.write.fetch_add(1, Ordering::AcqRel);
        let idx = (seq % self.slots.len() as u64) as usize;
        let mut incoming = Box::into_raw(Box::new(Record { seq, payload }));
        let mut incoming_seq = seq;
        loop {
            let displaced = self.slots[idx].swap(incoming, Ordering::AcqRel);
            if displaced.is_null() {
                return;
            }
            // Safety: the swap transferred sole ownership of `displaced` to
            // this thread -- the consumer can no longer reach it.
            let displaced = unsafe { Box::from_raw(displaced) };
            if displaced.seq < incoming_seq {
                // Normal overwrite: the displaced record was older and never
                // read. The consumer discovers the loss through the sequence
                // gap and charges it to the drop alert.
                return;
            }
            // A producer that stalled for a full lap has displaced a newer
            // record. The slot must never regress to an older sequence (the
            // reader relies on that to terminate), so put the newer record
            // back and retire an older one instead. Another lap must land
            // mid-swap for this to repeat.
            incoming_seq = displaced.seq;
            incoming = Box::into_raw(displaced);
        }
    }

    /// Probe the slot for `expected`. Consumer-only.
    ///
    /// A slot holding a newer sequence is the overwrite case: the skipped
    /// range is reported through the alert and the newer record is returned
    /// so the reader catches up instead of livelocking on a stale sequence.
    pub(crate) fn take(&self, expected: u64) -> Take {
        let idx = (expected % self.slots.len() as u64) as usize;
        let ptr = self.slots[idx].swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            // Either nothing published here yet, or a producer has claimed
            // the sequence but not yet swapped its record in.
            return Take::Empty;
        }
        // Safety: the swap transferred sole ownership of the record; every
        // non-null pointer in a slot came from `Box::into_raw` in `publish`.
        let record = unsafe { Box::from_raw(ptr) };
        if record.seq < expected {
            // Leftover of an earlier lap, already charged as dropped when the
            // reader skipped past it.
            return Take::Empty;
        }
        if record.seq > expected {
            (self.alert)(record.seq - expected);
        }
        Take::Item {
            payload: record.payload,
            seq: record.seq,
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Ring {
    fn drop(&mut self) {
        for slot in &self.slots {
            let ptr = slot.swap(ptr::null_mut(), Ordering::Relaxed);
            if !ptr.is_null() {
                // Safety: exclusive access in drop; the pointer is a live
                // `Box::into_raw` allocation.
                drop(unsafe { Box::from_raw(ptr) });
            }
        }
    }
}

/// The read half of a ring. Owns the read cursor as a plain integer -- the
/// single-reader discipline is what keeps consumption synchronization-free.
pub(crate) struct Consumer {
    ring: Arc<Ring>,
    next_seq: u64,
    discard_on_close: bool,
}

/// One consumer scheduling decision.
pub(crate) enum Step {
    /// A record was drained.
    Record(Vec<u8>),
    /// Nothing to read right now; the strategy decides how to wait.
    Idle,
    /// The ring is closed and (unless discarding) drained. Terminal.
    Done,
}

impl Consumer {
    pub(crate) fn new(ring: Arc<Ring>, discard_on_close: bool) -> Self {
        Self {
            ring,
            next_seq: 0,
            discard_on_close,
        }
    }

    /// Advance the read cursor by at most one record.
    ///
    /// The cursor is first clamped to `write - capacity`, the oldest sequence
    /// that can still be live; everything below it is charged to the drop
    /// alert in one call. The per-slot sequence check in [`Ring::take`] then
    /// only has to cover records overwritten while this probe was in flight.
    pub(crate) fn step(&mut self) -> Step {
        let closed = self.ring.is_closed();
        if closed && self.discard_on_close {
            return Step::Done;
        }

        let write = self.ring.write_cursor();
        if self.next_seq >= write {
            return if closed { Step::Done } else { Step::Idle };
        }

        let capacity = self.ring.capacity() as u64;
        if write - self.next_seq > capacity {
            let oldest_live = write - capacity;
            self.ring.alert(oldest_live - self.next_seq);
            self.next_seq = oldest_live;
        }

        match self.ring.take(self.next_seq) {
            Take::Item { payload, seq } => {
                self.next_seq = seq + 1;
                Step::Record(payload)
            }
            // A claimed-but-unswapped slot is an in-flight publish; it will
            // land momentarily, so treat it as idle even while closing.
            Take::Empty => Step::Idle,
        }
    }
}
