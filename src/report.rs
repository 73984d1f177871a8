//! Collecting diagnostics of a job.
//!
//! Nothing that goes wrong while replaying a page interrupts the job. Instead, every
//! noteworthy event is recorded in a [`Report`], which can be inspected once the job
//! is finished. Each entry is also forwarded to the [`log`] facade.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The severity of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    /// Informational, for example the list of used fonts.
    Info,
    /// Something was degraded, but output is still produced.
    Warning,
    /// Something failed and was skipped or replaced by a fallback.
    Error,
    /// Tracing of drawing operations.
    Debug,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportKind::Info => "Info",
            ReportKind::Warning => "Warning",
            ReportKind::Error => "Error",
            ReportKind::Debug => "Debug",
        };

        f.write_str(label)
    }
}

/// A single entry in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// The severity.
    pub kind: ReportKind,
    /// The page the entry belongs to, if any.
    pub page: Option<u32>,
    /// A human-readable description.
    pub message: String,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(page) = self.page {
            write!(f, " (Page {page})")?;
        }

        write!(f, ": {}", self.message)
    }
}

/// The in-memory diagnostic log of a job.
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Vec<ReportEntry>,
    record_debug: bool,
}

impl Report {
    /// Create a new report. Debug entries are only forwarded to the logger,
    /// unless `record_debug` is set.
    pub fn new(record_debug: bool) -> Self {
        Self {
            entries: vec![],
            record_debug,
        }
    }

    /// Add a new entry.
    pub fn add(&mut self, kind: ReportKind, page: Option<u32>, message: impl Into<String>) {
        let entry = ReportEntry {
            kind,
            page,
            message: message.into(),
        };

        match kind {
            ReportKind::Info => log::info!("{entry}"),
            ReportKind::Warning => log::warn!("{entry}"),
            ReportKind::Error => log::error!("{entry}"),
            ReportKind::Debug => log::debug!("{entry}"),
        }

        if kind != ReportKind::Debug || self.record_debug {
            self.entries.push(entry);
        }
    }

    /// All recorded entries, in the order they were added.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// The number of entries of a specific kind.
    pub fn count(&self, kind: ReportKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.count(ReportKind::Error) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_entries_are_not_recorded_by_default() {
        let mut report = Report::default();
        report.add(ReportKind::Debug, Some(1), "StrokeLine");
        report.add(ReportKind::Warning, Some(1), "glyph missing");

        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.count(ReportKind::Warning), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn entry_display() {
        let entry = ReportEntry {
            kind: ReportKind::Error,
            page: Some(3),
            message: "pattern missing".to_string(),
        };

        assert_eq!(entry.to_string(), "Error (Page 3): pattern missing");
    }
}
