// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter};

/// Marker used in place of a day count when the outcome is not a forward-looking
/// validity window (expired, unreachable, handshake errors).
pub const SENTINEL_DAYS: i64 = -1;

// --- Targets ---

/// A single TLS target, as read from the host list.
///
/// Ordering is lexical so that host sets iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Hostname {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// --- Outcomes ---

/// The closed set of classifications a probe can end in.
///
/// `TlsError` and `CertificateError` are catch-alls for handshake failures that
/// are neither expiry nor self-signed certificates, so that no probed host ever
/// disappears from the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Ok,
    Alert,
    Expired,
    SelfSigned,
    CantConnect,
    SocketError,
    CertificateError,
    TlsError,
}

impl OutcomeKind {
    /// Whether hosts in this bucket are forwarded to the notifier.
    pub fn needs_alert(self) -> bool {
        matches!(self, OutcomeKind::Alert | OutcomeKind::Expired)
    }
}

/// How loudly a report bucket is logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// The result of probing one hostname. Built once by the prober and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub outcome: OutcomeKind,
    pub days_remaining: i64,
    pub hostname: Hostname,
}

impl ProbeResult {
    pub fn new(outcome: OutcomeKind, days_remaining: i64, hostname: Hostname) -> Self {
        Self { outcome, days_remaining, hostname }
    }

    /// A failure outcome, which never carries a day count.
    pub fn failed(outcome: OutcomeKind, hostname: Hostname) -> Self {
        Self::new(outcome, SENTINEL_DAYS, hostname)
    }

    pub fn entry(&self) -> ReportEntry {
        ReportEntry { days_remaining: self.days_remaining, hostname: self.hostname.clone() }
    }
}

/// One `(days, hostname)` line inside a report bucket.
///
/// Field order matters: the derived `Ord` sorts by days first, then hostname,
/// which is the order the alert email uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportEntry {
    pub days_remaining: i64,
    pub hostname: Hostname,
}

impl ReportEntry {
    pub fn new(days_remaining: i64, hostname: impl Into<String>) -> Self {
        Self { days_remaining, hostname: Hostname::new(hostname) }
    }

    pub fn is_sentinel(&self) -> bool {
        self.days_remaining == SENTINEL_DAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn failed_results_carry_sentinel_days() {
        let result = ProbeResult::failed(OutcomeKind::CantConnect, "h3".into());
        assert_eq!(result.days_remaining, SENTINEL_DAYS);
        assert!(result.entry().is_sentinel());
    }

    #[test]
    fn only_alert_and_expired_need_alerting() {
        let alerting: Vec<_> = OutcomeKind::iter().filter(|k| k.needs_alert()).collect();
        assert_eq!(alerting, vec![OutcomeKind::Alert, OutcomeKind::Expired]);
    }

    #[test]
    fn entries_sort_by_days_then_hostname() {
        let mut entries = vec![
            ReportEntry::new(5, "x"),
            ReportEntry::new(-1, "y"),
            ReportEntry::new(2, "z"),
            ReportEntry::new(2, "a"),
        ];
        entries.sort();
        let order: Vec<_> = entries.iter().map(|e| e.hostname.as_str()).collect();
        assert_eq!(order, vec!["y", "a", "z", "x"]);
    }

    #[test]
    fn outcome_kind_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&OutcomeKind::CantConnect).unwrap(), "\"cant_connect\"");
        assert_eq!(OutcomeKind::SelfSigned.to_string(), "self_signed");
    }
}
