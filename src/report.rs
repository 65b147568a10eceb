//! Ledger of items skipped during a pipeline run.
//!
//! Every stage tolerates per-item failures (lookup misses, names without
//! identifiers, species without annotations) and keeps going. Instead of
//! disappearing silently, each skipped item is recorded here so it can be
//! printed after the run.

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

/// Pipeline stage that produced a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Synonyms,
    Identifiers,
    Model,
    Matching,
    Positions,
    Dataset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Synonyms => "synonyms",
            Stage::Identifiers => "identifiers",
            Stage::Model => "model",
            Stage::Matching => "matching",
            Stage::Positions => "positions",
            Stage::Dataset => "dataset",
        };
        write!(f, "{name}")
    }
}

/// How serious a skipped item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Expected loss, e.g. a name the service does not know.
    Info,
    /// Something failed and was skipped.
    Warning,
}

/// A single skipped item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub stage: Stage,
    /// The metabolite name, species id or query term concerned.
    pub subject: String,
    pub message: String,
    pub severity: Severity,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info".blue(),
            Severity::Warning => "warning".yellow(),
        };
        write!(
            f,
            "[{}] {}: {}\n\t└── {}",
            self.stage,
            severity,
            self.subject.bold(),
            self.message
        )
    }
}

/// Collected skip entries of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an expected loss.
    pub fn info(&mut self, stage: Stage, subject: impl Into<String>, message: impl Into<String>) {
        self.push(stage, subject, message, Severity::Info);
    }

    /// Records a failure that was skipped and logs it.
    pub fn warn(&mut self, stage: Stage, subject: impl Into<String>, message: impl Into<String>) {
        let subject = subject.into();
        let message = message.into();
        log::warn!("[{stage}] skipping {subject}: {message}");
        self.push(stage, subject, message, Severity::Warning);
    }

    fn push(
        &mut self,
        stage: Stage,
        subject: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) {
        self.entries.push(ReportEntry {
            stage,
            subject: subject.into(),
            message: message.into(),
            severity,
        });
    }

    /// Entries produced by `stage`.
    pub fn by_stage(&self, stage: Stage) -> Vec<&ReportEntry> {
        self.entries.iter().filter(|e| e.stage == stage).collect()
    }

    pub fn warnings(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Renders the report as a plain table.
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Stage", "Severity", "Subject", "Message"]);
        for entry in &self.entries {
            let severity = match entry.severity {
                Severity::Info => "info",
                Severity::Warning => "warning",
            };
            builder.push_record([
                entry.stage.to_string(),
                severity.to_string(),
                entry.subject.clone(),
                entry.message.clone(),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = Report::new();
        report.info(Stage::Identifiers, "unknown", "no identifiers found");
        report.warn(Stage::Synonyms, "glucose", "request timed out");

        assert_eq!(report.len(), 2);
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.by_stage(Stage::Synonyms).len(), 1);
        assert_eq!(report.by_stage(Stage::Model).len(), 0);
    }

    #[test]
    fn test_report_table_contains_entries() {
        let mut report = Report::new();
        report.info(Stage::Matching, "citrate", "no model species shares an identifier");
        let table = report.to_table();
        assert!(table.contains("citrate"));
        assert!(table.contains("matching"));
    }
}
