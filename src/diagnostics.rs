//! Side-channel messages from the pipelines.
//!
//! The pipelines never log through a global; they report to whatever sink
//! the caller passes in. The binary uses [`TracingDiagnostics`].

use std::cell::RefCell;

pub trait Diagnostics {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps every message in memory, in order. Handy in tests.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    messages: RefCell<Vec<(Level, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn info(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push((Level::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push((Level::Warn, message.to_string()));
    }
}
