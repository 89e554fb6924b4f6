//! Reconciliation driver
//!
//! Per record: verify → keep, or resolve → replace / flag. Exactly one verify
//! call and at most one search call per record, no retries. No failure stops
//! the batch; the worst outcome for a record is `Flag`.

use crate::progress::ConsoleProgress;
use crate::report::WARNING_NOTE;
use crate::services::record_extractor::CandidateRecord;
use crate::services::resolver::{Resolution, Resolver};
use crate::services::throttle::{FixedDelay, RecordHealth, ThrottlePolicy};
use crate::services::title_matcher::{ContainmentMatcher, TitleMatcher};
use crate::services::tmdb_client::MetadataSource;
use crate::services::verifier::{verify_record, Verification};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const DEFAULT_DELAY_MS: u64 = 250;

/// Terminal state of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Current identifier verified
    Keep,
    /// Replaced by the resolver's candidate
    Replace { previous_id: String },
    /// No confident resolution; current identifier kept with warning
    Flag,
}

/// Identifier to emit plus optional warning suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub correct_id: String,
    /// Empty or `WARNING_NOTE`
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct ReconciledRecord {
    pub record: CandidateRecord,
    pub verification: Verification,
    /// `None` when verification passed and no search was made
    pub resolution: Option<Resolution>,
    pub outcome: Outcome,
    pub result: ResolutionResult,
}

impl ReconciledRecord {
    /// Whether an external call for this record failed on the service side
    ///
    /// A 404 for a mistyped identifier leaves the record `Clean`.
    pub fn health(&self) -> RecordHealth {
        let search_failed = matches!(
            self.resolution,
            Some(Resolution::SearchFailed { transient: true, .. })
        );
        if self.verification.is_transient_failure() || search_failed {
            RecordHealth::Degraded
        } else {
            RecordHealth::Clean
        }
    }
}

/// Run statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationStatistics {
    pub total: usize,
    pub kept: usize,
    pub replaced: usize,
    pub flagged: usize,
    /// Verify calls that returned a different title
    pub mismatches: usize,
    /// Verify calls that failed outright
    pub lookup_failures: usize,
    /// Search calls that failed outright
    pub search_failures: usize,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ReconciliationStatistics {
    fn record(&mut self, reconciled: &ReconciledRecord) {
        self.total += 1;
        match reconciled.outcome {
            Outcome::Keep => self.kept += 1,
            Outcome::Replace { .. } => self.replaced += 1,
            Outcome::Flag => self.flagged += 1,
        }
        match reconciled.verification {
            Verification::Match { .. } => {}
            Verification::Mismatch { .. } => self.mismatches += 1,
            Verification::LookupFailed { .. } => self.lookup_failures += 1,
        }
        if matches!(reconciled.resolution, Some(Resolution::SearchFailed { .. })) {
            self.search_failures += 1;
        }
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} records: {} kept, {} replaced, {} flagged ({} mismatches, {} lookup failures, {} search failures) in {:.1}s",
            self.total,
            self.kept,
            self.replaced,
            self.flagged,
            self.mismatches,
            self.lookup_failures,
            self.search_failures,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Full run result, records in input order
#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub records: Vec<ReconciledRecord>,
    pub statistics: ReconciliationStatistics,
}

/// Sequential reconciliation driver
pub struct Reconciler {
    source: Arc<dyn MetadataSource>,
    matcher: Box<dyn TitleMatcher>,
    resolver: Resolver,
    throttle: Box<dyn ThrottlePolicy>,
    progress: ConsoleProgress,
}

impl Reconciler {
    /// Containment matching, fixed 250ms pause, no year check, silent progress
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            matcher: Box::new(ContainmentMatcher),
            resolver: Resolver::default(),
            throttle: Box::new(FixedDelay::new(Duration::from_millis(DEFAULT_DELAY_MS))),
            progress: ConsoleProgress::silent(),
        }
    }

    pub fn with_matcher(mut self, matcher: Box<dyn TitleMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_throttle(mut self, throttle: Box<dyn ThrottlePolicy>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_progress(mut self, progress: ConsoleProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Console stream, for mirroring the final listing
    pub fn progress_mut(&mut self) -> &mut ConsoleProgress {
        &mut self.progress
    }

    /// Verify one record and resolve it if needed
    pub async fn reconcile_record(&mut self, record: CandidateRecord) -> ReconciledRecord {
        let verification = verify_record(
            self.source.as_ref(),
            self.matcher.as_ref(),
            &record,
            &mut self.progress,
        )
        .await;

        if verification.is_match() {
            let result = ResolutionResult {
                correct_id: record.current_id.clone(),
                note: String::new(),
            };
            return ReconciledRecord {
                record,
                verification,
                resolution: None,
                outcome: Outcome::Keep,
                result,
            };
        }

        let resolution = self
            .resolver
            .resolve(
                self.source.as_ref(),
                &record.clean_title,
                record.year.as_deref(),
            )
            .await;

        let (outcome, result) = match resolution.hit() {
            Some(hit) => {
                self.progress.replaced(&record, &hit.id, &hit.title);
                (
                    Outcome::Replace {
                        previous_id: record.current_id.clone(),
                    },
                    ResolutionResult {
                        correct_id: hit.id.clone(),
                        note: String::new(),
                    },
                )
            }
            None => {
                self.progress.flagged(&record);
                (
                    Outcome::Flag,
                    ResolutionResult {
                        correct_id: record.current_id.clone(),
                        note: WARNING_NOTE.to_string(),
                    },
                )
            }
        };

        ReconciledRecord {
            record,
            verification,
            resolution: Some(resolution),
            outcome,
            result,
        }
    }

    /// Reconcile every record in order, pausing between records
    pub async fn run(&mut self, records: Vec<CandidateRecord>) -> ReconciliationReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = records.len();

        info!(
            records = total,
            matcher = self.matcher.name(),
            throttle = self.throttle.name(),
            "Starting reconciliation"
        );

        let mut report = ReconciliationReport {
            records: Vec::with_capacity(total),
            statistics: ReconciliationStatistics {
                started_at: Some(started_at),
                ..Default::default()
            },
        };

        for (index, record) in records.into_iter().enumerate() {
            let reconciled = self.reconcile_record(record).await;
            let health = reconciled.health();

            report.statistics.record(&reconciled);
            report.records.push(reconciled);

            if index + 1 < total {
                self.throttle.pause(health).await;
            }
        }

        self.progress.finish();
        report.statistics.elapsed = start.elapsed();

        info!("Reconciliation complete: {}", report.statistics.display_string());
        report
    }
}
