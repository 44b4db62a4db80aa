//! Error types for logger setup.

use thiserror::Error;

/// Errors raised while assembling or installing the logging stack.
#[derive(Debug, Error)]
pub enum Error {
    /// Building a diode writer failed.
    #[error(transparent)]
    Diode(#[from] weir_diode::Error),

    /// The rolling file appender rejected its configuration.
    #[error("failed to initialize rolling file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    /// A global subscriber was already installed.
    #[error("failed to install global subscriber: {0}")]
    InstallSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
