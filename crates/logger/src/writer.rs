//! `MakeWriter` glue for the diode handle.

use tracing_subscriber::fmt::MakeWriter;
use weir_diode::NonBlocking;

/// Hands each formatted event a clone of the non-blocking producer handle.
pub(crate) struct EventWriter(pub(crate) NonBlocking);

impl<'a> MakeWriter<'a> for EventWriter {
    type Writer = NonBlocking;

    fn make_writer(&'a self) -> Self::Writer {
        self.0.clone()
    }
}
