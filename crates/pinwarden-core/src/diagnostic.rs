//! Diagnostic warn channel for boards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Receives advisory warnings raised while components register with a board.
///
/// Implementations must not fail or panic.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, emitter: &str, message: &str);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, emitter: &str, message: &str) {
        warn!(emitter = %emitter, "{}", message);
    }
}

/// A warning as it was reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Type name of the component that raised it
    pub emitter: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Keeps every warning in report order and forwards it to `tracing`
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded warnings, oldest first
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(emitter, message)` pairs, oldest first
    pub fn messages(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .map(|d| (d.emitter, d.message))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, emitter: &str, message: &str) {
        TracingSink.warn(emitter, message);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Diagnostic {
                emitter: emitter.to_string(),
                message: message.to_string(),
                at: Utc::now(),
            });
    }
}
