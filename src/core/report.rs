// src/core/report.rs

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::catalog::{BUCKETS, BucketDetail};
use crate::core::models::{OutcomeKind, ProbeResult, ReportEntry, Severity};

const SEPARATOR: &str = "---------------------------------------------------";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report has no bucket for outcome `{0}`")]
    MissingBucket(OutcomeKind),
}

/// Probe results grouped by outcome.
///
/// Every outcome has a bucket from construction onwards, empty or not.
/// Within a bucket, entries keep the order they were drained in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Report {
    buckets: BTreeMap<OutcomeKind, Vec<ReportEntry>>,
}

/// One rendered bucket: heading plus one line per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub label: &'static str,
    pub severity: Severity,
    pub lines: Vec<String>,
}

impl Report {
    pub fn empty() -> Self {
        Self { buckets: OutcomeKind::iter().map(|kind| (kind, Vec::new())).collect() }
    }

    /// Groups results into their outcome buckets.
    pub fn aggregate(results: &[ProbeResult]) -> Self {
        let mut report = Self::empty();
        for result in results {
            report.buckets.entry(result.outcome).or_default().push(result.entry());
        }
        report
    }

    pub fn bucket(&self, kind: OutcomeKind) -> Result<&[ReportEntry], ReportError> {
        self.buckets.get(&kind).map(Vec::as_slice).ok_or(ReportError::MissingBucket(kind))
    }

    /// Number of hosts across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// `Alert` entries followed by `Expired` entries, unsorted.
    pub fn alert_batch(&self) -> Result<AlertBatch, ReportError> {
        let mut entries = Vec::new();
        for detail in BUCKETS.iter().filter(|d| d.kind.needs_alert()) {
            entries.extend_from_slice(self.bucket(detail.kind)?);
        }
        Ok(AlertBatch(entries))
    }

    /// Renders each bucket in presentation order. Fails if a bucket the
    /// presentation table names is absent.
    pub fn render(&self) -> Result<Vec<RenderedSection>, ReportError> {
        BUCKETS.iter().map(|detail| self.render_bucket(detail)).collect()
    }

    fn render_bucket(&self, detail: &BucketDetail) -> Result<RenderedSection, ReportError> {
        let lines = self
            .bucket(detail.kind)?
            .iter()
            .map(|entry| match detail.kind {
                OutcomeKind::Alert => format!("\t{} - {}", entry.days_remaining, entry.hostname),
                _ => format!("\t{}", entry.hostname),
            })
            .collect();
        Ok(RenderedSection { label: detail.label, severity: detail.severity, lines })
    }

    /// Writes the rendered report to the log at each bucket's severity.
    pub fn log(&self) -> Result<(), ReportError> {
        for section in self.render()? {
            emit(section.severity, section.label);
            for line in &section.lines {
                emit(section.severity, line);
            }
            info!("{SEPARATOR}");
        }
        Ok(())
    }
}

fn emit(severity: Severity, message: &str) {
    match severity {
        Severity::Critical => error!("{message}"),
        Severity::Warning => warn!("{message}"),
        Severity::Info => info!("{message}"),
    }
}

/// Hosts that need a notification: certificates expiring soon or already expired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertBatch(Vec<ReportEntry>);

impl AlertBatch {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries ordered by days remaining, so expired hosts come first.
    pub fn sorted(&self) -> Vec<ReportEntry> {
        let mut entries = self.0.clone();
        entries.sort();
        entries
    }
}
