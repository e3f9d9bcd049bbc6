//! Event reporting for engine runs.
//!
//! Engines report through the `EventSink` trait, which keeps them decoupled
//! from any front end. `ChannelSink` forwards events over a crossbeam channel
//! so the caller can poll them from another thread.
//!
//! Communication is one-directional: engine to caller.

use std::fmt;

use crossbeam_channel::Sender;
use serde::Serialize;

use crate::model::Outcome;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One textual log line emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub severity: Severity,
    pub message: String,
}

impl LogLine {
    pub fn info(message: impl Into<String>) -> Self {
        LogLine {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        LogLine {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        LogLine {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Events delivered over a channel by the worker layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Percent complete, non-decreasing within a run
    Progress(u8),
    Log(LogLine),
    /// Sent exactly once, last
    Finished(Outcome),
}

/// Trait for receiving events from a running engine.
///
/// All methods are called synchronously on the engine's thread.
pub trait EventSink: Send {
    /// Called after every completed unit with the new percentage.
    fn on_progress(&self, percent: u8);

    /// Called for every log line.
    fn on_log(&self, line: LogLine);

    /// Called once when the run has a terminal outcome.
    fn on_finished(&self, _outcome: Outcome) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_progress(&self, _percent: u8) {}

    fn on_log(&self, _line: LogLine) {}
}

/// An EventSink that forwards events into a channel.
///
/// Send errors are ignored: a caller that dropped its receiver no longer cares.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<EngineEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl EventSink for ChannelSink {
    fn on_progress(&self, percent: u8) {
        let _ = self.sender.send(EngineEvent::Progress(percent));
    }

    fn on_log(&self, line: LogLine) {
        let _ = self.sender.send(EngineEvent::Log(line));
    }

    fn on_finished(&self, outcome: Outcome) {
        let _ = self.sender.send(EngineEvent::Finished(outcome));
    }
}

/// Mirrors each log line into `tracing` before handing it to the sink.
pub(crate) struct Reporter<'a> {
    sink: &'a dyn EventSink,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(sink: &'a dyn EventSink) -> Self {
        Reporter { sink }
    }

    pub(crate) fn progress(&self, percent: u8) {
        self.sink.on_progress(percent);
    }

    pub(crate) fn info(&self, message: String) {
        tracing::info!("{message}");
        self.sink.on_log(LogLine::info(message));
    }

    pub(crate) fn warning(&self, message: String) {
        tracing::warn!("{message}");
        self.sink.on_log(LogLine::warning(message));
    }

    pub(crate) fn error(&self, message: String) {
        tracing::error!("{message}");
        self.sink.on_log(LogLine::error(message));
    }

    pub(crate) fn finished(&self, outcome: Outcome) {
        self.sink.on_finished(outcome);
    }
}

/// Test helper: records every event in order.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<EngineEvent>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<EngineEvent> {
            self.events.lock().unwrap().clone()
        }

        pub(crate) fn progress(&self) -> Vec<u8> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    EngineEvent::Progress(p) => Some(p),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn logs(&self) -> Vec<LogLine> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    EngineEvent::Log(line) => Some(line),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn errors(&self) -> Vec<String> {
            self.logs()
                .into_iter()
                .filter(|l| l.severity == Severity::Error)
                .map(|l| l.message)
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn on_progress(&self, percent: u8) {
            self.events.lock().unwrap().push(EngineEvent::Progress(percent));
        }

        fn on_log(&self, line: LogLine) {
            self.events.lock().unwrap().push(EngineEvent::Log(line));
        }

        fn on_finished(&self, outcome: Outcome) {
            self.events.lock().unwrap().push(EngineEvent::Finished(outcome));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (tx, rx) = unbounded();
        let sink = ChannelSink::new(tx);
        sink.on_log(LogLine::info("start"));
        sink.on_progress(50);
        sink.on_finished(Outcome::Success);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::Log(LogLine::info("start")),
                EngineEvent::Progress(50),
                EngineEvent::Finished(Outcome::Success),
            ]
        );
    }

    #[test]
    fn test_channel_sink_ignores_dropped_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);
        let sink = ChannelSink::new(tx);
        sink.on_progress(10);
    }

    #[test]
    fn test_log_line_display() {
        assert_eq!(LogLine::error("boom").to_string(), "[ERROR] boom");
        assert_eq!(LogLine::warning("hm").to_string(), "[WARN] hm");
    }
}
