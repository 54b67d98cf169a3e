//! Structured diagnostics for tolerant label loading.
//!
//! Lines a loader skips or repairs are reported here instead of only being
//! printed, so callers and tests can assert on them.

use std::fmt;

/// One skipped or repaired input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    /// 1-based line number in the label file.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outcome summary of a tolerant load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    diagnostics: Vec<LineDiagnostic>,
}

impl ParseReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic; it is also logged immediately.
    pub fn push(&mut self, line: usize, message: impl Into<String>) {
        let diagnostic = LineDiagnostic {
            line,
            message: message.into(),
        };
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[LineDiagnostic] {
        &self.diagnostics
    }

    /// True when every line loaded without problems.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
