//! The `Logger` collaborator: a thin seam above the structured message types
//! in [`crate::observability`]. `infof` carries progress events, `error`
//! carries failures; both simply ask the event to log itself, since each
//! message type already knows its own `tracing` level.

use std::fmt::Display;
use std::sync::Mutex;

use crate::observability::messages::StructuredLog;

/// Anything loggable: a human-readable line plus structured `tracing`
/// fields. Every type in `observability::messages` implements this via its
/// `Display` + `StructuredLog` impls.
pub trait Event: Display + StructuredLog {}
impl<T: Display + StructuredLog> Event for T {}

pub trait Logger: Send + Sync {
    fn infof(&self, event: &dyn Event);
    fn error(&self, event: &dyn Event);
}

/// The default `Logger`, bridging into `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn infof(&self, event: &dyn Event) {
        event.log();
    }

    fn error(&self, event: &dyn Event) {
        event.log();
    }
}

/// Captures every logged line for assertions in tests, in the spirit of the
/// reference implementation's stub backends used to exercise logic without
/// a real side-effecting collaborator.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn infof(&self, event: &dyn Event) {
        self.lines.lock().unwrap().push(event.to_string());
    }

    fn error(&self, event: &dyn Event) {
        self.lines.lock().unwrap().push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::messages::apply::ApplyStarted;

    #[test]
    fn recording_logger_captures_the_display_line() {
        let logger = RecordingLogger::new();
        logger.infof(&ApplyStarted { resource_count: 2 });
        assert_eq!(logger.lines(), vec!["applying catalog of 2 resource(s)"]);
    }
}
