//! Compiler diagnostics
//!
//! Stylesheet compilation never fails as a whole. Problems are collected
//! with a severity and the compiler decides what to drop:
//! WARN keeps the value, ERR drops the declaration or rule, FATAL
//! abandons the current statement.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warn,
    Err,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warn => "WARN",
            Severity::Err => "ERR",
            Severity::Fatal => "FATAL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}:{}: {}", self.severity, self.line, self.column, self.message)
    }
}

/// Severity-leveled collector
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, severity: Severity, line: u32, column: u32, message: impl Into<String>) {
        let diagnostic = Diagnostic { severity, line, column, message: message.into() };
        if severity == Severity::Warn {
            tracing::warn!(%diagnostic, "stylesheet warning");
        } else {
            tracing::debug!(%diagnostic, "stylesheet error");
        }
        self.entries.push(diagnostic);
    }

    pub fn warn(&mut self, line: u32, column: u32, message: impl Into<String>) {
        self.report(Severity::Warn, line, column, message);
    }

    pub fn error(&mut self, line: u32, column: u32, message: impl Into<String>) {
        self.report(Severity::Err, line, column, message);
    }

    pub fn fatal(&mut self, line: u32, column: u32, message: impl Into<String>) {
        self.report(Severity::Fatal, line, column, message);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries at or above `severity`
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity >= severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count_at_least(Severity::Err) > 0
    }

    /// Entries recorded after `mark`
    pub(crate) fn since(&self, mark: usize) -> &[Diagnostic] {
        &self.entries[mark.min(self.entries.len())..]
    }
}
