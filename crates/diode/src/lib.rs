//! Lock-free, non-blocking writer for log pipelines.
//!
//! Any number of threads write records through a cloneable handle that never
//! blocks, never fails, and never allocates beyond a pooled buffer copy; a
//! single background pump drains the records into a possibly slow byte sink.
//! The two are decoupled by a fixed-capacity, overwrite-on-full ring: under
//! sustained overload the oldest unread records are dropped, the newest are
//! kept, and the loss is reported through a callback.
//!
//! The pump waits for data with one of two strategies, selected by the
//! configured poll interval: a strictly positive interval polls the ring on
//! that period, a zero interval parks the pump thread until a publish wakes
//! it.
//!
//! ```
//! use std::io::Write as _;
//! use weir_diode::{IoSink, NonBlockingBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut writer, guard) = NonBlockingBuilder::new()
//!     .capacity(1024)
//!     .finish(IoSink::new(std::io::stdout()))?;
//!
//! writer.write_all(b"one record\n")?;
//! guard.close()?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod pool;
mod ring;
mod sink;
mod strategy;
mod writer;

pub use error::{Error, Result};
pub use sink::{IoSink, Sink};
pub use writer::{CloseBehavior, NonBlocking, NonBlockingBuilder, PumpGuard, non_blocking};
