//! Diagnostic interception
//!
//! Hosts route their error channel through favella so every diagnostic is
//! spoken (curses and all) before the original sink sees it. The sink is
//! always invoked; diagnostics are never swallowed.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::error;

use crate::controller::Favella;

/// Terminal consumer of diagnostic messages.
pub trait DiagnosticSink: Send {
    fn report(&mut self, message: &str);
}

/// Adapter turning any `FnMut(&str)` closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> DiagnosticSink for FnSink<F>
where
    F: FnMut(&str) + Send,
{
    fn report(&mut self, message: &str) {
        (self.0)(message)
    }
}

/// Default sink: forwards diagnostics to the `tracing` error stream.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, message: &str) {
        error!("{}", message);
    }
}

/// A sink a host splices into its error channel so every diagnostic runs
/// through the shared favella instance (curse injection, speech, then the
/// instance's own sink) before anything else happens to it.
pub struct DiagnosticRelay {
    favella: Arc<Mutex<Favella>>,
}

impl DiagnosticRelay {
    pub fn new(favella: Arc<Mutex<Favella>>) -> Self {
        Self { favella }
    }
}

impl DiagnosticSink for DiagnosticRelay {
    fn report(&mut self, message: &str) {
        self.favella.lock().report_error(message);
    }
}

impl fmt::Debug for DiagnosticRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticRelay").finish_non_exhaustive()
    }
}
