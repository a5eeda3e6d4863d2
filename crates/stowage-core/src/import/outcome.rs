use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one spreadsheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped,
    Error,
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutcome::Created => write!(f, "created"),
            RowOutcome::Updated => write!(f, "updated"),
            RowOutcome::Skipped => write!(f, "skipped"),
            RowOutcome::Error => write!(f, "error"),
        }
    }
}

/// Per-row import log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowResult {
    /// 1-based spreadsheet row number. Data rows start at 2, below the
    /// header row.
    pub row: usize,
    pub outcome: RowOutcome,
    /// Why the row was skipped or rejected. Absent for clean rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Physical data rows in the sheet, including duplicates absorbed
    /// during dedup. Absorbed rows have no entry in the result log, so
    /// `total_rows` can exceed the other counters' sum.
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportSummary {
    /// Tally outcomes from a result log.
    pub fn from_results(total_rows: usize, results: &[ImportRowResult]) -> ImportSummary {
        let mut summary = ImportSummary {
            total_rows,
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                RowOutcome::Created => summary.created += 1,
                RowOutcome::Updated => summary.updated += 1,
                RowOutcome::Skipped => summary.skipped += 1,
                RowOutcome::Error => summary.errors += 1,
            }
        }
        summary
    }

    /// Rows absorbed by dedup (no result entry of their own).
    pub fn absorbed(&self) -> usize {
        self.total_rows
            .saturating_sub(self.created + self.updated + self.skipped + self.errors)
    }
}

/// Everything an import run produces: the summary plus the per-row log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub results: Vec<ImportRowResult>,
}
