//! Error types for the diode writer.

use thiserror::Error;

/// Errors surfaced by writer construction and teardown. The publish path
/// itself is infallible by design.
#[derive(Debug, Error)]
pub enum Error {
    /// The ring needs at least one slot.
    #[error("diode capacity must be at least one slot")]
    InvalidCapacity,

    /// Spawning the pump thread failed.
    #[error("failed to spawn pump thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The pump thread panicked before it could be joined.
    #[error("pump thread panicked")]
    PumpPanicked,

    /// The sink reported an error while closing.
    #[error("sink close failed: {0}")]
    SinkClose(#[source] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
