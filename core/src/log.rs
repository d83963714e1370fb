//! Diagnostic message sink.
//!
//! The client reports what it sees (status lines, received JSON, decode
//! failures) as plain messages. Each message is dropped unless the
//! effective [`LogState`] for the call is [`LogState::Enabled`].

use std::fmt;

/// Per-call switch for diagnostic messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogState {
    #[default]
    Enabled,
    Disabled,
}

impl LogState {
    pub fn is_enabled(self) -> bool {
        self == LogState::Enabled
    }
}

impl From<bool> for LogState {
    fn from(enabled: bool) -> Self {
        if enabled {
            LogState::Enabled
        } else {
            LogState::Disabled
        }
    }
}

/// Receives diagnostic messages from the client.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "request_client", "{message}");
    }
}

/// A sink paired with the state in effect for one call.
pub(crate) struct Logger<'a> {
    sink: &'a dyn LogSink,
    state: LogState,
}

impl<'a> Logger<'a> {
    pub(crate) fn new(sink: &'a dyn LogSink, state: LogState) -> Self {
        Self { sink, state }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.state.is_enabled()
    }

    pub(crate) fn log(&self, message: fmt::Arguments<'_>) {
        if self.enabled() {
            self.sink.log(&message.to_string());
        }
    }
}
