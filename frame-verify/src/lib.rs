//! frame-verify library interface
//!
//! Reconciles the static award-winner listing used by the Frame app against a
//! movie-metadata service: every entry is verified by identifier, repaired by
//! title search when it does not match, and flagged when no repair is found.

pub mod config;
pub mod progress;
pub mod reconciler;
pub mod report;
pub mod services;

pub use crate::reconciler::{
    Outcome, ReconciledRecord, ReconciliationReport, ReconciliationStatistics, Reconciler,
};
pub use crate::report::{render_report, write_report, CorrectedLine, WARNING_NOTE};
pub use crate::services::record_extractor::{extract_records, CandidateRecord};
