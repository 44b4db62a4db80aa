//! Reusable byte-buffer free list for the short-lived copies that travel
//! through the ring.

use crossbeam::queue::ArrayQueue;

/// Starting capacity for freshly allocated buffers; log records are usually
/// well under this.
const INITIAL_CAPACITY: usize = 512;

/// Buffers that have grown past this are dropped instead of recycled, so one
/// oversized record cannot pin its allocation in the pool forever.
const RECYCLE_MAX: usize = 64 * 1024;

pub(crate) struct BufferPool {
    free: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub(crate) fn new(slots: usize) -> Self {
        Self {
            free: ArrayQueue::new(slots),
        }
    }

    /// Pop a cleared buffer, or allocate when the free list is empty.
    pub(crate) fn get(&self) -> Vec<u8> {
        self.free
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY))
    }

    /// Return a buffer after its record has been written out. Oversized
    /// buffers and overflow of the free list are simply dropped.
    pub(crate) fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() <= RECYCLE_MAX {
            buf.clear();
            let _ = self.free.push(buf);
        }
    }
}
