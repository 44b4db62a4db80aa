//! The non-blocking writer façade: producer handle, background pump, and
//! shutdown guard.

use crate::error::{Error, Result};
use crate::pool::BufferPool;
use crate::ring::{Consumer, DropAlert, Ring};
use crate::sink::{IoSink, Sink};
use crate::strategy::{Poller, Strategy, Waiter};
use crossbeam::sync::{Parker, Unparker};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default ring size when the builder is not told otherwise.
const DEFAULT_CAPACITY: usize = 32 * 1024;

/// The buffer pool never needs more free buffers than records in flight, and
/// past a point a bigger free list is just idle memory.
const MAX_POOL_SLOTS: usize = 1024;

type SinkErrorCallback = Box<dyn Fn(&io::Error) + Send + Sync>;

/// What `close` does with records still sitting in the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseBehavior {
    /// Drain everything published before the close signal, then exit.
    #[default]
    Drain,
    /// Exit at the next check without draining.
    Discard,
}

/// Configures and spawns a non-blocking writer.
///
/// A strictly positive [`poll_interval`](Self::poll_interval) selects the
/// polling strategy; the default of zero selects the parking strategy.
pub struct NonBlockingBuilder {
    capacity: usize,
    poll_interval: Duration,
    close_behavior: CloseBehavior,
    thread_name: String,
    on_full_drop: Option<DropAlert>,
    on_sink_error: Option<SinkErrorCallback>,
}

impl Default for NonBlockingBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            poll_interval: Duration::ZERO,
            close_behavior: CloseBehavior::default(),
            thread_name: "weir-diode".to_string(),
            on_full_drop: None,
            on_sink_error: None,
        }
    }
}

impl NonBlockingBuilder {
    /// Create a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ring slots. Must be at least one.
    #[must_use]
    pub fn capacity(mut self, slots: usize) -> Self {
        self.capacity = slots;
        self
    }

    /// Interval between ring checks. Zero parks the pump between publishes
    /// instead of polling.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// What to do with undrained records on close.
    #[must_use]
    pub fn close_behavior(mut self, behavior: CloseBehavior) -> Self {
        self.close_behavior = behavior;
        self
    }

    /// Name for the pump thread.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Callback invoked with the number of records lost to overwrite since
    /// its previous invocation. Defaults to a no-op.
    #[must_use]
    pub fn on_full_drop(mut self, alert: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_full_drop = Some(Box::new(alert));
        self
    }

    /// Callback invoked with sink write errors. Producers never see these;
    /// without a callback they are absorbed.
    #[must_use]
    pub fn on_sink_error(mut self, callback: impl Fn(&io::Error) + Send + Sync + 'static) -> Self {
        self.on_sink_error = Some(Box::new(callback));
        self
    }

    /// Spawn the pump and return the producer handle and its guard.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] for a zero-slot ring, raised before any
    /// thread is spawned, or [`Error::Spawn`] if the pump thread cannot be
    /// created.
    pub fn finish<S: Sink>(self, sink: S) -> Result<(NonBlocking, PumpGuard)> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity);
        }

        let alert = self.on_full_drop.unwrap_or_else(|| Box::new(|_| {}));
        let ring = Arc::new(Ring::new(self.capacity, alert));
        let pool = Arc::new(BufferPool::new(self.capacity.min(MAX_POOL_SLOTS)));

        let discard = self.close_behavior == CloseBehavior::Discard;
        let consumer = Consumer::new(Arc::clone(&ring), discard);
        let (strategy, unparker) = if self.poll_interval.is_zero() {
            let parker = Parker::new();
            let unparker = parker.unparker().clone();
            (Strategy::Waiter(Waiter::new(consumer, parker)), Some(unparker))
        } else {
            (
                Strategy::Poller(Poller::new(consumer, self.poll_interval)),
                None,
            )
        };

        let pump_pool = Arc::clone(&pool);
        let on_sink_error = self.on_sink_error;
        let handle = thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || pump(strategy, sink, &pump_pool, on_sink_error.as_deref()))
            .map_err(Error::Spawn)?;

        let writer = NonBlocking {
            ring: Arc::clone(&ring),
            pool,
            unparker: unparker.clone(),
        };
        let guard = PumpGuard {
            ring,
            unparker,
            handle: Mutex::new(Some(handle)),
        };
        Ok((writer, guard))
    }
}

/// Wrap a plain [`std::io::Write`] with the default configuration.
///
/// # Errors
///
/// See [`NonBlockingBuilder::finish`].
pub fn non_blocking<W>(writer: W) -> Result<(NonBlocking, PumpGuard)>
where
    W: io::Write + Send + 'static,
{
    NonBlockingBuilder::new().finish(IoSink::new(writer))
}

/// Cloneable producer handle.
///
/// `write` copies the record into a pooled buffer, publishes it, and returns
/// immediately; it never observes backpressure or sink failures.
#[derive(Clone)]
pub struct NonBlocking {
    ring: Arc<Ring>,
    pool: Arc<BufferPool>,
    unparker: Option<Unparker>,
}

impl io::Write for NonBlocking {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut payload = self.pool.get();
        payload.extend_from_slice(buf);
        self.ring.publish(payload);
        if let Some(unparker) = &self.unparker {
            unparker.unpark();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Owns the pump thread. Dropping it closes the writer.
pub struct PumpGuard {
    ring: Arc<Ring>,
    unparker: Option<Unparker>,
    handle: Mutex<Option<JoinHandle<io::Result<()>>>>,
}

impl PumpGuard {
    /// Signal cancellation, wait for the pump to exit, and close the sink.
    ///
    /// Idempotent: the second and later calls return `Ok` without doing
    /// anything.
    ///
    /// # Errors
    ///
    /// [`Error::SinkClose`] with the sink's close error, or
    /// [`Error::PumpPanicked`] if the pump thread died.
    pub fn close(&self) -> Result<()> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        self.ring.close();
        if let Some(unparker) = &self.unparker {
            unparker.unpark();
        }
        match handle.join() {
            Ok(sink_close) => sink_close.map_err(Error::SinkClose),
            Err(_) => Err(Error::PumpPanicked),
        }
    }
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Drain records into the sink until the strategy reports the terminal
/// state, then close the sink and hand its result to the joining `close`.
fn pump<S: Sink>(
    mut strategy: Strategy,
    mut sink: S,
    pool: &BufferPool,
    on_sink_error: Option<&(dyn Fn(&io::Error) + Send + Sync)>,
) -> io::Result<()> {
    while let Some(payload) = strategy.next() {
        if let Err(e) = sink.write_all(&payload) {
            if let Some(callback) = on_sink_error {
                callback(&e);
            }
        }
        pool.put(payload);
    }
    if let Err(e) = sink.flush() {
        if let Some(callback) = on_sink_error {
            callback(&e);
        }
    }
    sink.close()
}
