//! Sink for non-fatal diagnostics.
//!
//! Malformed selector fragments and undecodable response bodies are reported
//! here instead of being raised. The client receives a sink at construction
//! so tests can capture what was reported.

use parking_lot::Mutex;
use tracing::warn;

pub trait Diagnostics: Send + Sync {
    fn report(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, message: &str) {
        warn!(target: "cluster_client", "{message}");
    }
}

/// Keeps every reported message in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
