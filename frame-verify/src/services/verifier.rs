//! Identifier verification
//!
//! A record is confirmed when the service returns a movie for its identifier
//! and the configured matcher accepts the returned title. Lookup failures are
//! not distinguished from mismatches by the reconciler: both trigger resolution.

use super::record_extractor::CandidateRecord;
use super::title_matcher::TitleMatcher;
use super::tmdb_client::MetadataSource;
use crate::progress::ConsoleProgress;

/// Verification result for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Identifier resolves to the expected title
    Match { fetched_title: String },
    /// Identifier resolves to some other title
    Mismatch { fetched_title: String },
    /// Not found, transport or decode failure
    LookupFailed { error: String, transient: bool },
}

impl Verification {
    pub fn is_match(&self) -> bool {
        matches!(self, Verification::Match { .. })
    }

    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Verification::LookupFailed { .. })
    }

    /// Lookup failed because of the service, not the identifier
    pub fn is_transient_failure(&self) -> bool {
        matches!(self, Verification::LookupFailed { transient: true, .. })
    }
}

/// Check `record.current_id` against the service
pub async fn verify_record(
    source: &dyn MetadataSource,
    matcher: &dyn TitleMatcher,
    record: &CandidateRecord,
    progress: &mut ConsoleProgress,
) -> Verification {
    match source.fetch_by_id(&record.current_id).await {
        Ok(details) => {
            if matcher.matches(&record.clean_title, &details.title) {
                progress.matched();
                Verification::Match {
                    fetched_title: details.title,
                }
            } else {
                tracing::info!(
                    id = %record.current_id,
                    expected = %record.clean_title,
                    found = %details.title,
                    matcher = matcher.name(),
                    "Title mismatch"
                );
                progress.mismatch(record, &details.title);
                Verification::Mismatch {
                    fetched_title: details.title,
                }
            }
        }
        Err(e) => {
            tracing::warn!(id = %record.current_id, error = %e, "Lookup by id failed");
            progress.lookup_failed(record, &e.to_string());
            Verification::LookupFailed {
                error: e.to_string(),
                transient: e.is_transient(),
            }
        }
    }
}
