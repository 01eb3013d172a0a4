//! Structured advisories returned alongside scan and display results.
//!
//! Non-fatal conditions (a poor optimizer choice, a method switched for the
//! duration of a scan, per-point errors that could not be computed) are
//! recorded here in emission order. Each record is also logged once through
//! `tracing::warn!`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What kind of advisory a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The active optimizer is not recommended for confidence limits.
    InappropriateMethod,
    /// The optimizer was swapped for the duration of a projection scan.
    MethodSwitched,
    /// Per-point errors are unavailable with the active statistic.
    MissingStatErrors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Ordered advisory records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advisory and emit it as a warning.
    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = ?kind, "{message}");
        self.records.push(Diagnostic { kind, message });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any record has the given kind.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.records.iter().any(|d| d.kind == kind)
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.records.iter().map(|d| d.kind).collect()
    }
}
