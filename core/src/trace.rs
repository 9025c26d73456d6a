use std::fmt;
use std::sync::Arc;

/// Diagnostic sink collections and databases report into.
///
/// Implementations must not panic or block; a failing sink drops the message.
pub trait TraceSink: Send + Sync + fmt::Debug {
    fn trace(&self, message: fmt::Arguments<'_>);
}

pub type SharedTraceSink = Arc<dyn TraceSink>;

/// Forwards messages to `tracing` at debug level when enabled.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    enabled: bool,
}

impl TracingSink {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TraceSink for TracingSink {
    fn trace(&self, message: fmt::Arguments<'_>) {
        if self.enabled {
            tracing::debug!(target: "emberdb", "{message}");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn trace(&self, _message: fmt::Arguments<'_>) {}
}

pub(crate) fn default_sink() -> SharedTraceSink {
    Arc::new(TracingSink::default())
}
