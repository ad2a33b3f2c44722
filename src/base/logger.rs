//! Debug logger used by the logging decorators.

use std::fmt;
use std::sync::Arc;

/// Sink for the human-readable progress lines emitted by the resolver,
/// dialer and handshaker logging decorators.
pub trait DebugLogger: Send + Sync {
    fn debug(&self, message: &str);
}

impl<L: DebugLogger + ?Sized> DebugLogger for Arc<L> {
    fn debug(&self, message: &str) {
        (**self).debug(message)
    }
}

/// Forwards every line to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl DebugLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "probenet", "{}", message);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl DebugLogger for NullLogger {
    fn debug(&self, _message: &str) {}
}

/// Shared logger handle.
pub type SharedLogger = Arc<dyn DebugLogger>;

/// Returns the default logger.
pub fn default_logger() -> SharedLogger {
    Arc::new(TracingLogger)
}

/// Formats an address list the way the logging decorators print it.
pub(crate) struct DisplayList<'a, T>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for DisplayList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
