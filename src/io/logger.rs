use std::sync::{Arc, Mutex};

/// Logging collaborator handed to the parsers, the index and the writer.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Forwards to the `tracing` macros. The subscriber is installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "tally", "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "tally", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "tally", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "tally", "{}", msg);
    }
}

pub fn tracing_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Keeps every message in memory. Used by hosts that surface diagnostics in
/// their own UI, and by tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        MemoryLogger::default()
    }

    fn push(&self, level: Level, msg: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, msg.to_string()));
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages logged at exactly `level`
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}
