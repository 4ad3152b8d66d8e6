// src/app.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::AlertConfig;
use crate::core::models::Hostname;
use crate::core::report::{Report, ReportError};
use crate::core::scanner::{Probe, run_all};
use crate::notify::{Notifier, NotifyError};

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// What a finished run produced.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub requested: usize,
    pub completed: usize,
    pub report: Report,
    pub notified: bool,
}

/// One batch invocation: probe every host, log the report, alert if needed.
pub struct App {
    alert: AlertConfig,
    probe: Arc<dyn Probe>,
    notifier: Box<dyn Notifier>,
}

impl App {
    pub fn new(alert: AlertConfig, probe: Arc<dyn Probe>, notifier: Box<dyn Notifier>) -> Self {
        Self { alert, probe, notifier }
    }

    pub async fn run(&self, hostnames: &BTreeSet<Hostname>) -> Result<RunSummary, RunError> {
        info!(hosts = hostnames.len(), "Total hosts to be checked.");

        let results = run_all(Arc::clone(&self.probe), hostnames, self.alert.max_concurrency).await;
        let report = Report::aggregate(&results);
        report.log()?;

        let batch = report.alert_batch()?;
        let notified = if batch.is_empty() {
            info!("Nothing needs attention; no alert sent.");
            false
        } else {
            self.notifier.notify(&batch).await?;
            true
        };

        info!("Request to proceed with {} certificates.", hostnames.len());
        info!("Done for {} certificates.", results.len());

        Ok(RunSummary { requested: hostnames.len(), completed: results.len(), report, notified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{OutcomeKind, ProbeResult, ReportEntry, SENTINEL_DAYS};
    use crate::core::report::AlertBatch;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedProbe(HashMap<&'static str, (OutcomeKind, i64)>);

    #[async_trait]
    impl Probe for FixedProbe {
        async fn probe(&self, hostname: &Hostname) -> ProbeResult {
            let (outcome, days) = self.0.get(hostname.as_str()).copied().unwrap_or((OutcomeKind::Ok, 365));
            ProbeResult::new(outcome, days, hostname.clone())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Vec<ReportEntry>>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, batch: &AlertBatch) -> Result<(), NotifyError> {
            if self.fail {
                let source = "not an address".parse::<lettre::Address>().unwrap_err();
                return Err(NotifyError::Address { address: "relay".to_string(), source });
            }
            self.sent.lock().unwrap().push(batch.sorted());
            Ok(())
        }
    }

    fn app(probe: FixedProbe, notifier: RecordingNotifier) -> App {
        App::new(AlertConfig::default(), Arc::new(probe), Box::new(notifier))
    }

    fn hosts(names: &[&str]) -> BTreeSet<Hostname> {
        names.iter().map(|n| Hostname::new(*n)).collect()
    }

    #[tokio::test]
    async fn healthy_expired_and_unreachable_hosts() {
        let probe = FixedProbe(HashMap::from([
            ("h1", (OutcomeKind::Ok, 90)),
            ("h2", (OutcomeKind::Expired, SENTINEL_DAYS)),
            ("h3", (OutcomeKind::CantConnect, SENTINEL_DAYS)),
        ]));
        let notifier = RecordingNotifier::default();
        let sent = Arc::clone(&notifier.sent);

        let summary = app(probe, notifier).run(&hosts(&["h1", "h2", "h3"])).await.unwrap();

        let report = &summary.report;
        assert_eq!(report.bucket(OutcomeKind::Ok).unwrap(), &[ReportEntry::new(90, "h1")]);
        assert_eq!(report.bucket(OutcomeKind::Expired).unwrap(), &[ReportEntry::new(-1, "h2")]);
        assert_eq!(report.bucket(OutcomeKind::CantConnect).unwrap(), &[ReportEntry::new(-1, "h3")]);
        assert_eq!((summary.requested, summary.completed), (3, 3));
        assert!(summary.notified);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], vec![ReportEntry::new(-1, "h2")]);
    }

    #[tokio::test]
    async fn no_notification_without_alerts() {
        let probe = FixedProbe(HashMap::from([("down", (OutcomeKind::SocketError, SENTINEL_DAYS))]));
        let notifier = RecordingNotifier::default();
        let sent = Arc::clone(&notifier.sent);

        let summary = app(probe, notifier).run(&hosts(&["up", "down"])).await.unwrap();

        assert!(!summary.notified);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_ends_the_run() {
        let probe = FixedProbe(HashMap::from([("soon", (OutcomeKind::Alert, 3))]));
        let notifier = RecordingNotifier { fail: true, ..RecordingNotifier::default() };

        let err = app(probe, notifier).run(&hosts(&["soon"])).await.unwrap_err();
        assert!(matches!(err, RunError::Notify(_)));
    }

    #[tokio::test]
    async fn empty_host_list_reports_nothing() {
        let notifier = RecordingNotifier::default();
        let summary = app(FixedProbe(HashMap::new()), notifier).run(&BTreeSet::new()).await.unwrap();
        assert_eq!(summary.report.total(), 0);
        assert!(!summary.notified);
    }
}
