// src/core/classifier.rs

//! Maps probe failures onto the outcome taxonomy.
//!
//! Failures are typed at the point where they are detected (the verifier, the
//! TCP connect, the handshake), so classification here is a plain match with no
//! I/O and no inspection of error text.

use crate::core::models::{Hostname, OutcomeKind, ProbeResult};
use std::io;
use thiserror::Error;

/// Why a probe did not produce a validity window.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("certificate has expired")]
    Expired,

    #[error("self-signed certificate")]
    SelfSigned,

    #[error("certificate rejected: {0:?}")]
    Certificate(rustls::CertificateError),

    #[error("peer presented no certificate")]
    MissingCertificate,

    #[error("certificate could not be parsed: {0}")]
    Unparseable(String),

    #[error("TLS error: {0}")]
    Tls(rustls::Error),

    #[error("timed out")]
    Timeout,

    #[error("socket error: {0}")]
    Socket(#[source] io::Error),
}

/// Returns the bucket a failure belongs to.
pub fn classify(failure: &ProbeFailure) -> OutcomeKind {
    match failure {
        ProbeFailure::Expired => OutcomeKind::Expired,
        ProbeFailure::SelfSigned => OutcomeKind::SelfSigned,
        ProbeFailure::Certificate(_)
        | ProbeFailure::MissingCertificate
        | ProbeFailure::Unparseable(_) => OutcomeKind::CertificateError,
        ProbeFailure::Tls(_) => OutcomeKind::TlsError,
        ProbeFailure::Timeout => OutcomeKind::CantConnect,
        ProbeFailure::Socket(_) => OutcomeKind::SocketError,
    }
}

/// Builds the result recorded for a failed probe. Failures always carry the sentinel.
pub fn failure_result(hostname: Hostname, failure: &ProbeFailure) -> ProbeResult {
    ProbeResult::failed(classify(failure), hostname)
}
