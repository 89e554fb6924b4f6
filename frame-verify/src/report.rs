//! Corrected listing output
//!
//! One line per input record, input order, original comment preserved:
//! `<id>,   // <comment><note>`.

use crate::reconciler::{ReconciledRecord, ReconciliationReport};
use frame_common::Result;
use std::fmt;
use std::path::Path;

/// Suffix appended to records that could not be verified or repaired
pub const WARNING_NOTE: &str = " ⚠️ CHECK MANUALLY";

/// One output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedLine {
    pub id: String,
    pub comment: String,
    pub note: String,
}

impl From<&ReconciledRecord> for CorrectedLine {
    fn from(reconciled: &ReconciledRecord) -> Self {
        Self {
            id: reconciled.result.correct_id.clone(),
            comment: reconciled.record.full_comment.clone(),
            note: reconciled.result.note.clone(),
        }
    }
}

impl fmt::Display for CorrectedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},   // {}{}", self.id, self.comment, self.note)
    }
}

/// Render the corrected listing (trailing newline when non-empty)
pub fn render_report(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    for reconciled in &report.records {
        out.push_str(&CorrectedLine::from(reconciled).to_string());
        out.push('\n');
    }
    out
}

/// Write the corrected listing to `path`
pub fn write_report(report: &ReconciliationReport, path: &Path) -> Result<()> {
    std::fs::write(path, render_report(report))?;
    tracing::info!(
        path = %path.display(),
        lines = report.records.len(),
        "Wrote corrected listing"
    );
    Ok(())
}
