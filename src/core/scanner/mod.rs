// src/core/scanner/mod.rs

// The certificate prober, its verifier, and the scheduler that fans probes out
// across every host in a run.
pub mod ssl_scanner;
pub mod verifier;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::core::models::{Hostname, ProbeResult};

/// A single-host check. Implementations must be shareable across tasks.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, hostname: &Hostname) -> ProbeResult;
}

/// Probes every host concurrently and returns the results in completion order.
///
/// At most `max_concurrency` probes are in flight at once; `0` removes the
/// ceiling. Each unit sends its result through a channel, and the channel is
/// only drained after every unit has finished. A unit that panics contributes
/// nothing, so the returned vector can be shorter than `hostnames`.
///
/// # Arguments
///
/// * `probe` - The prober shared by all units.
/// * `hostnames` - The deduplicated targets.
/// * `max_concurrency` - The in-flight ceiling.
pub async fn run_all(
    probe: Arc<dyn Probe>,
    hostnames: &BTreeSet<Hostname>,
    max_concurrency: usize,
) -> Vec<ProbeResult> {
    let permits = if max_concurrency == 0 { hostnames.len().max(1) } else { max_concurrency };
    let permits = permits.min(Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(permits));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut units = JoinSet::new();

    info!(hosts = hostnames.len(), ceiling = permits, "Launching probes.");
    for (unit_id, hostname) in hostnames.iter().cloned().enumerate() {
        let probe = Arc::clone(&probe);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        units.spawn(async move {
            // The semaphore is never closed, so acquisition only fails if that changes.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            debug!(unit_id, host = %hostname, "Starting unit.");
            let result = probe.probe(&hostname).await;
            // The receiver outlives every unit.
            let _ = tx.send(result);
        });
    }
    drop(tx);

    while let Some(joined) = units.join_next().await {
        if let Err(e) = joined {
            error!(panic = %e, "Probe unit terminated without a result.");
        }
    }
    info!("Pulling done.");

    let mut results = Vec::with_capacity(hostnames.len());
    while let Ok(result) = rx.try_recv() {
        results.push(result);
    }
    info!(results = results.len(), "Results gathered.");
    results
}
