//! Subscriber assembly: fmt layers writing through diode-backed writers.

use crate::config::{Encoding, LoggerConfig};
use crate::error::Result;
use crate::writer::EventWriter;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Subscriber;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, registry};
use weir_diode::{IoSink, NonBlockingBuilder, PumpGuard};

/// Keeps the background pumps alive and tracks records lost to overload.
///
/// Dropping the guard drains and closes every writer; events logged after
/// that go nowhere.
pub struct LoggerGuard {
    pumps: Vec<PumpGuard>,
    dropped: Arc<AtomicU64>,
}

impl LoggerGuard {
    /// Cumulative number of records dropped across all outputs.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drain pending records, stop the pumps, and close the sinks.
    ///
    /// Idempotent, like the pump guards it owns.
    ///
    /// # Errors
    ///
    /// The first pump or sink close failure, if any.
    pub fn close(&self) -> Result<()> {
        for pump in &self.pumps {
            pump.close()?;
        }
        Ok(())
    }
}

impl LoggerConfig {
    /// Build the subscriber and install it as the global default.
    ///
    /// # Errors
    ///
    /// Configuration errors from the diode or the file appender, or
    /// [`Error::InstallSubscriber`](crate::Error::InstallSubscriber) if a
    /// global subscriber is already set.
    pub fn init(self) -> Result<LoggerGuard> {
        let (subscriber, guard) = self.subscriber()?;
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(guard)
    }

    /// Build the subscriber without installing it, for callers composing
    /// their own registry or scoping it with `with_default`.
    ///
    /// # Errors
    ///
    /// Configuration errors from the diode or the file appender.
    pub fn subscriber(self) -> Result<(impl Subscriber + Send + Sync + 'static, LoggerGuard)> {
        let dropped = Arc::new(AtomicU64::new(0));
        let mut pumps = Vec::new();

        let file_writer = if matches!(self.encoding, Encoding::Json | Encoding::All) {
            let mut builder = RollingFileAppender::builder()
                .rotation(self.rotation.clone())
                .filename_prefix(self.file_prefix.as_str());
            if let Some(max) = self.max_log_files {
                builder = builder.max_log_files(max);
            }
            let appender = builder.build(&self.directory)?;
            let (writer, pump) = self.diode(&dropped).finish(IoSink::new(appender))?;
            pumps.push(pump);
            Some(writer)
        } else {
            None
        };

        let console_writer = if matches!(self.encoding, Encoding::Console | Encoding::All) {
            let (writer, pump) = self.diode(&dropped).finish(IoSink::new(io::stdout()))?;
            pumps.push(pump);
            Some(writer)
        } else {
            None
        };

        let file_layer =
            file_writer.map(|writer| fmt::layer().json().with_writer(EventWriter(writer)));
        let console_layer = console_writer.map(|writer| fmt::layer().with_writer(EventWriter(writer)));

        let subscriber = registry()
            .with(self.level)
            .with(file_layer)
            .with(console_layer);
        Ok((subscriber, LoggerGuard { pumps, dropped }))
    }

    fn diode(&self, dropped: &Arc<AtomicU64>) -> NonBlockingBuilder {
        let counter = Arc::clone(dropped);
        NonBlockingBuilder::new()
            .capacity(self.capacity)
            .poll_interval(self.poll_interval)
            .thread_name(format!("weir-log-{}", self.file_prefix))
            .on_full_drop(move |missed| {
                counter.fetch_add(missed, Ordering::Relaxed);
            })
    }
}
