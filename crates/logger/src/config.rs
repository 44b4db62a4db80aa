//! Logger configuration and the production/development presets.

use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub use tracing_appender::rolling::Rotation;

/// Which outputs to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// JSON records to the rotating file only.
    Json,
    /// Human-readable records to stdout only.
    Console,
    /// Both of the above.
    All,
}

/// Configuration for the logging stack.
///
/// Encoding and level selection are handled by `tracing-subscriber`, file
/// rotation by `tracing-appender`; the capacity and poll interval configure
/// the diode writer sitting between them.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub(crate) level: LevelFilter,
    pub(crate) encoding: Encoding,
    pub(crate) directory: PathBuf,
    pub(crate) file_prefix: String,
    pub(crate) rotation: Rotation,
    pub(crate) max_log_files: Option<usize>,
    pub(crate) capacity: usize,
    pub(crate) poll_interval: Duration,
}

impl LoggerConfig {
    /// Opinionated production configuration: INFO and above as JSON to a
    /// daily-rotated file, three rotated files retained, parking consumer.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: LevelFilter::INFO,
            encoding: Encoding::Json,
            directory: PathBuf::from("logs"),
            file_prefix: "app".to_string(),
            rotation: Rotation::DAILY,
            max_log_files: Some(3),
            capacity: 32 * 1024,
            poll_interval: Duration::ZERO,
        }
    }

    /// Opinionated development configuration: DEBUG and above to the
    /// console, a small ring, and a 1 ms poller.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: LevelFilter::DEBUG,
            encoding: Encoding::Console,
            directory: PathBuf::from("logs"),
            file_prefix: "app".to_string(),
            rotation: Rotation::DAILY,
            max_log_files: Some(1),
            capacity: 1024,
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Start from the production preset and override piecemeal.
    #[must_use]
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder {
            config: Self::production(),
        }
    }
}

/// Builder for [`LoggerConfig`].
#[derive(Debug, Clone)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// Minimum enabled level.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Which outputs to install.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Directory the rotating log files live in.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = directory.into();
        self
    }

    /// File name prefix for the rotating log files.
    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Rotation period.
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// How many rotated files to retain; `None` keeps them all.
    #[must_use]
    pub fn max_log_files(mut self, max: Option<usize>) -> Self {
        self.config.max_log_files = max;
        self
    }

    /// Diode slot count.
    #[must_use]
    pub fn capacity(mut self, slots: usize) -> Self {
        self.config.capacity = slots;
        self
    }

    /// Diode poll interval; zero parks the pump instead of polling.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Finalize the configuration.
    #[must_use]
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}
