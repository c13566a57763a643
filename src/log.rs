//! Diagnostic sinks receiving registration and resolution events.

use std::sync::Arc;

/// Shared callback receiving one diagnostic message at a time
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Print each message on its own line of the standard output (the default sink)
pub fn stdout_sink() -> LogSink {
    Arc::new(|message: &str| println!("{}", message))
}

/// Discard all messages
pub fn silent_sink() -> LogSink {
    Arc::new(|_: &str| {})
}
