//! End-to-end tests for the non-blocking writer.

use std::io::{self, Write as _};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};
use weir_diode::{CloseBehavior, Error, NonBlockingBuilder, Sink};

/// Records every write as its own entry, preserving record boundaries.
#[derive(Clone, Default)]
struct CaptureSink {
    records: Arc<Mutex<Vec<Vec<u8>>>>,
    closes: Arc<AtomicUsize>,
}

impl Sink for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.records.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sleeps on every write before recording it.
struct SlowSink {
    delay: Duration,
    inner: CaptureSink,
}

impl Sink for SlowSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        std::thread::sleep(self.delay);
        self.inner.write(buf)
    }
}

/// Blocks its first write until released, then behaves like a capture sink.
struct GatedSink {
    gate: Option<Receiver<()>>,
    inner: CaptureSink,
}

impl Sink for GatedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(gate) = self.gate.take() {
            let _ = gate.recv();
        }
        self.inner.write(buf)
    }
}

/// Fails every write; close succeeds.
struct FailingSink {
    failures: Arc<AtomicUsize>,
}

impl Sink for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.failures.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::other("sink is broken"))
    }
}

/// Accepts writes, fails on close.
#[derive(Default)]
struct FailingCloseSink;

impl Sink for FailingCloseSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn close(&mut self) -> io::Result<()> {
        Err(io::Error::other("close is broken"))
    }
}

#[test]
fn zero_capacity_is_a_configuration_error() {
    let result = NonBlockingBuilder::new()
        .capacity(0)
        .finish(CaptureSink::default());
    assert!(matches!(result, Err(Error::InvalidCapacity)));
}

#[test]
fn round_trip_preserves_bytes_and_order() {
    let sink = CaptureSink::default();
    let records = sink.records.clone();
    let (mut writer, guard) = NonBlockingBuilder::new()
        .capacity(64)
        .finish(sink)
        .unwrap();

    let published: Vec<Vec<u8>> = (0..32u32)
        .map(|i| format!("record {i}\n").into_bytes())
        .collect();
    for record in &published {
        assert_eq!(writer.write(record).unwrap(), record.len());
    }
    guard.close().unwrap();

    assert_eq!(*records.lock().unwrap(), published);
}

#[test]
fn sink_close_runs_exactly_once() {
    let sink = CaptureSink::default();
    let closes = sink.closes.clone();
    let (_writer, guard) = NonBlockingBuilder::new().finish(sink).unwrap();

    guard.close().unwrap();
    guard.close().unwrap();
    guard.close().unwrap();
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn close_propagates_the_sink_error_once() {
    let (_writer, guard) = NonBlockingBuilder::new().finish(FailingCloseSink).unwrap();
    assert!(matches!(guard.close(), Err(Error::SinkClose(_))));
    // Second close is a no-op success, not a replay of the failure.
    assert!(guard.close().is_ok());
}

#[test]
fn producer_latency_is_independent_of_sink_latency() {
    let sink = SlowSink {
        delay: Duration::from_millis(25),
        inner: CaptureSink::default(),
    };
    let (mut writer, guard) = NonBlockingBuilder::new()
        .capacity(1024)
        .close_behavior(CloseBehavior::Discard)
        .finish(sink)
        .unwrap();

    let mut worst = Duration::ZERO;
    for i in 0..50u32 {
        let record = format!("slow sink record {i}\n");
        let start = Instant::now();
        writer.write_all(record.as_bytes()).unwrap();
        worst = worst.max(start.elapsed());
    }
    guard.close().unwrap();

    assert!(
        worst < Duration::from_millis(10),
        "producer write took {worst:?} against a 25ms sink"
    );
}

#[test]
fn waiter_close_returns_promptly_when_drained() {
    let sink = SlowSink {
        delay: Duration::from_millis(50),
        inner: CaptureSink::default(),
    };
    let records = sink.inner.records.clone();
    let (mut writer, guard) = NonBlockingBuilder::new().finish(sink).unwrap();

    writer.write_all(b"only record\n").unwrap();
    // Let the pump get the record through the slow sink.
    while records.lock().unwrap().is_empty() {
        std::thread::sleep(Duration::from_millis(5));
    }

    let start = Instant::now();
    guard.close().unwrap();
    assert!(
        start.elapsed() < Duration::from_millis(100),
        "waiter close took {:?}",
        start.elapsed()
    );
}

#[test]
fn poller_close_is_bounded_by_one_interval() {
    let interval = Duration::from_millis(40);
    let sink = SlowSink {
        delay: Duration::from_millis(50),
        inner: CaptureSink::default(),
    };
    let (_writer, guard) = NonBlockingBuilder::new()
        .poll_interval(interval)
        .finish(sink)
        .unwrap();

    // The ring is empty, so the pump is mid-sleep; close must not wait for
    // the sink or for more than roughly one interval.
    std::thread::sleep(Duration::from_millis(10));
    let start = Instant::now();
    guard.close().unwrap();
    assert!(
        start.elapsed() < interval * 5,
        "poller close took {:?} with a {interval:?} interval",
        start.elapsed()
    );
}

#[test]
fn discard_on_close_skips_pending_records() {
    let (gate_tx, gate_rx) = mpsc::sync_channel::<()>(1);
    let sink = GatedSink {
        gate: Some(gate_rx),
        inner: CaptureSink::default(),
    };
    let records = sink.inner.records.clone();
    let (mut writer, guard) = NonBlockingBuilder::new()
        .capacity(64)
        .close_behavior(CloseBehavior::Discard)
        .finish(sink)
        .unwrap();

    for i in 0..16u32 {
        writer.write_all(format!("{i}\n").as_bytes()).unwrap();
    }

    // Close while the pump is stuck in the gated first write, then release
    // the gate: only the in-flight record may reach the sink.
    let closer = std::thread::spawn(move || guard.close().unwrap());
    std::thread::sleep(Duration::from_millis(50));
    // The pump may already have exited without consuming the gate.
    let _ = gate_tx.send(());
    closer.join().unwrap();

    assert!(records.lock().unwrap().len() <= 1);
}

#[test]
fn overrun_burst_keeps_a_tail_and_accounts_for_drops() {
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_in_alert = Arc::clone(&dropped);
    let (gate_tx, gate_rx) = mpsc::sync_channel(1);
    let sink = GatedSink {
        gate: Some(gate_rx),
        inner: CaptureSink::default(),
    };
    let records = sink.inner.records.clone();

    let (mut writer, guard) = NonBlockingBuilder::new()
        .capacity(4)
        .on_full_drop(move |missed| {
            dropped_in_alert.fetch_add(missed, Ordering::Relaxed);
        })
        .finish(sink)
        .unwrap();

    let published = [b"a", b"b", b"c", b"d", b"e", b"f"];
    for record in published {
        writer.write_all(record).unwrap();
    }
    let _ = gate_tx.send(());
    guard.close().unwrap();

    let drained = records.lock().unwrap().clone();
    assert_eq!(drained.last().unwrap(), b"f", "newest record must survive");
    assert_eq!(
        drained.len() as u64 + dropped.load(Ordering::Relaxed),
        published.len() as u64,
        "every record is either drained or counted dropped"
    );
    // Drained records appear in publish order.
    let mut cursor = published.iter();
    for record in &drained {
        assert!(
            cursor.any(|p| p.as_slice() == record.as_slice()),
            "record {record:?} out of order"
        );
    }
}

#[test]
fn sink_write_errors_reach_the_callback_but_not_producers() {
    let failures = Arc::new(AtomicUsize::new(0));
    let sink = FailingSink {
        failures: Arc::clone(&failures),
    };
    let reported = Arc::new(AtomicUsize::new(0));
    let reported_in_callback = Arc::clone(&reported);

    let (mut writer, guard) = NonBlockingBuilder::new()
        .on_sink_error(move |_| {
            reported_in_callback.fetch_add(1, Ordering::SeqCst);
        })
        .finish(sink)
        .unwrap();

    for _ in 0..8 {
        // The producer must stay oblivious to the broken sink.
        assert_eq!(writer.write(b"doomed\n").unwrap(), 7);
    }
    guard.close().unwrap();

    assert_eq!(failures.load(Ordering::SeqCst), 8);
    assert_eq!(reported.load(Ordering::SeqCst), 8);
}

#[test]
fn clones_share_one_ring() {
    let sink = CaptureSink::default();
    let records = sink.records.clone();
    let (writer, guard) = NonBlockingBuilder::new()
        .capacity(1024)
        .finish(sink)
        .unwrap();

    std::thread::scope(|scope| {
        for t in 0..4u32 {
            let mut writer = writer.clone();
            scope.spawn(move || {
                for i in 0..100u32 {
                    writer
                        .write_all(format!("{t}:{i}\n").as_bytes())
                        .unwrap();
                }
            });
        }
    });
    guard.close().unwrap();

    assert_eq!(records.lock().unwrap().len(), 400);
}
