//! The byte-sink contract the pump drains into.

use std::io::{self, Write};

/// Destination for drained records.
///
/// Whether a sink supports a close lifecycle is decided here, once, by the
/// implementation: sinks with teardown override [`Sink::close`], everything
/// else inherits the no-op. The pump never inspects the sink beyond this
/// trait.
pub trait Sink: Send + 'static {
    /// Write a buffer, returning how many bytes were consumed.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error; the pump reports it through the
    /// writer's error callback and moves on.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Flush buffered data, if the sink buffers.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Tear the sink down. Called exactly once, after the pump has exited.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error to the writer's `close`.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Write an entire buffer, retrying short writes.
    ///
    /// # Errors
    ///
    /// Propagates the first underlying I/O error.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no bytes",
                    ));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Adapter giving any [`std::io::Write`] the sink contract. Close flushes;
/// wrap the writer yourself to add real teardown.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: io::Write + Send + 'static> IoSink<W> {
    /// Wrap a plain writer.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write + Send + 'static> Sink for IoSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
