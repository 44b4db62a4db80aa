//! Structured logging that never blocks the threads doing the logging.
//!
//! This crate is configuration glue: level selection and encoding are
//! delegated to `tracing-subscriber`, file rotation to `tracing-appender`,
//! and every output is wrapped in a [`weir-diode`](weir_diode) writer so a
//! slow disk or console can only ever cost dropped log records, never a
//! stalled caller.
//!
//! # Usage
//!
//! ```no_run
//! use weir_logger::LoggerConfig;
//!
//! fn main() -> weir_logger::Result<()> {
//!     let guard = LoggerConfig::production().init()?;
//!
//!     tracing::info!(port = 8080, "listening");
//!
//!     // Drains pending records and closes the outputs.
//!     guard.close()?;
//!     Ok(())
//! }
//! ```
//!
//! Records are emitted through the ordinary `tracing` macros; nothing here
//! wraps them. Under sustained overload the oldest unread records are
//! dropped rather than applying backpressure — [`LoggerGuard::dropped`]
//! reports how many.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod subscriber;
mod writer;

pub use config::{Encoding, LoggerConfig, LoggerConfigBuilder, Rotation};
pub use error::{Error, Result};
pub use subscriber::LoggerGuard;
