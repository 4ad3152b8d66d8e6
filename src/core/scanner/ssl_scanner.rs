// src/core/scanner/ssl_scanner.rs

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rustls::pki_types::ServerName;
use rustls::{CertificateError, ClientConfig, RootCertStore};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

use super::Probe;
use super::verifier::{ClassifyingVerifier, is_self_signed};
use crate::config::AlertConfig;
use crate::core::classifier::{ProbeFailure, failure_result};
use crate::core::models::{Hostname, OutcomeKind, ProbeResult};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Errors raised while building the shared TLS client.
#[derive(Debug, Error)]
pub enum ProberError {
    #[error("could not build certificate verifier: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),

    #[error("could not configure TLS client: {0}")]
    Tls(#[from] rustls::Error),
}

/// Probes one host per call: TCP connect, TLS handshake with SNI, leaf
/// certificate expiry. One instance is shared by every concurrent unit.
pub struct CertProber {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
    buffer: TimeDelta,
}

impl CertProber {
    /// Builds a prober that trusts the bundled web-PKI roots.
    pub fn new(config: &AlertConfig) -> Result<Self, ProberError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(config, roots)
    }

    pub fn with_roots(config: &AlertConfig, roots: RootCertStore) -> Result<Self, ProberError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = ClassifyingVerifier::new(roots, provider.clone())?;
        let client_config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            port: config.port,
            timeout: config.timeout(),
            buffer: TimeDelta::days(config.buffer_days),
        })
    }

    /// Connects, handshakes and returns the leaf's `notAfter`. The whole
    /// sequence shares a single deadline.
    async fn fetch_expiry(&self, hostname: &Hostname) -> Result<DateTime<Utc>, ProbeFailure> {
        let exchange = async {
            let server_name = ServerName::try_from(hostname.as_str().to_owned())
                .map_err(|e| ProbeFailure::Socket(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

            debug!(host = %hostname, port = self.port, "Connecting TCP stream.");
            let stream = TcpStream::connect((hostname.as_str(), self.port))
                .await
                .map_err(socket_failure)?;

            debug!(host = %hostname, "Performing TLS handshake.");
            let tls = self
                .connector
                .connect(server_name, stream)
                .await
                .map_err(handshake_failure)?;

            let (_, connection) = tls.get_ref();
            let leaf = connection
                .peer_certificates()
                .and_then(|chain| chain.first())
                .ok_or(ProbeFailure::MissingCertificate)?;

            let (_, x509) = parse_x509_certificate(leaf.as_ref())
                .map_err(|e| ProbeFailure::Unparseable(e.to_string()))?;
            Ok::<_, ProbeFailure>(asn1_time_to_chrono_utc(&x509.validity().not_after))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::Timeout),
        }
    }

    /// Buckets a successful handshake by how much validity is left.
    fn classify_expiry(&self, hostname: Hostname, not_after: DateTime<Utc>, now: DateTime<Utc>) -> ProbeResult {
        let remaining = not_after.signed_duration_since(now);
        let days = floor_days(remaining);
        let outcome = if remaining < self.buffer { OutcomeKind::Alert } else { OutcomeKind::Ok };
        ProbeResult::new(outcome, days, hostname)
    }
}

#[async_trait]
impl Probe for CertProber {
    async fn probe(&self, hostname: &Hostname) -> ProbeResult {
        info!(host = %hostname, "Checking certificate.");

        let result = match self.fetch_expiry(hostname).await {
            Ok(not_after) => {
                debug!(host = %hostname, expires = %not_after.to_rfc3339(), "Certificate expiry read.");
                self.classify_expiry(hostname.clone(), not_after, Utc::now())
            }
            Err(failure) => {
                warn!(host = %hostname, error = %failure, "Probe failed.");
                failure_result(hostname.clone(), &failure)
            }
        };

        info!(host = %hostname, outcome = %result.outcome, days = result.days_remaining, "Host classified.");
        result
    }
}

fn socket_failure(error: io::Error) -> ProbeFailure {
    match error.kind() {
        io::ErrorKind::TimedOut => ProbeFailure::Timeout,
        _ => ProbeFailure::Socket(error),
    }
}

/// tokio-rustls reports handshake failures as `io::Error`s wrapping the
/// `rustls::Error`; anything else is a transport problem.
fn handshake_failure(error: io::Error) -> ProbeFailure {
    let tls_error = error.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()).cloned();
    let Some(tls_error) = tls_error else {
        return socket_failure(error);
    };

    if is_self_signed(&tls_error) {
        return ProbeFailure::SelfSigned;
    }
    match tls_error {
        rustls::Error::InvalidCertificate(CertificateError::Expired) => ProbeFailure::Expired,
        rustls::Error::InvalidCertificate(other) => ProbeFailure::Certificate(other),
        other => ProbeFailure::Tls(other),
    }
}

/// Whole days left, rounded towards negative infinity.
fn floor_days(remaining: TimeDelta) -> i64 {
    remaining.num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
