// src/core/catalog.rs

//! Static presentation table for report buckets.
//!
//! The order of `BUCKETS` is the order the report is rendered in. Keeping it as
//! data means the renderer never depends on map iteration order.

use crate::core::models::{OutcomeKind, Severity};

/// How one report bucket is titled and how loudly it is logged.
#[derive(Debug)]
pub struct BucketDetail {
    pub kind: OutcomeKind,
    /// The heading printed above the bucket's entries.
    pub label: &'static str,
    pub severity: Severity,
}

pub static BUCKETS: &[BucketDetail] = &[
    BucketDetail { kind: OutcomeKind::Ok, label: "These certificates are ok:", severity: Severity::Info },
    BucketDetail { kind: OutcomeKind::SocketError, label: "Socket error:", severity: Severity::Info },
    BucketDetail { kind: OutcomeKind::CantConnect, label: "Can't connect to server:", severity: Severity::Info },
    BucketDetail { kind: OutcomeKind::TlsError, label: "TLS protocol error:", severity: Severity::Warning },
    BucketDetail {
        kind: OutcomeKind::CertificateError,
        label: "Certificate validation error:",
        severity: Severity::Warning,
    },
    BucketDetail { kind: OutcomeKind::SelfSigned, label: "Self signed certificates:", severity: Severity::Info },
    BucketDetail { kind: OutcomeKind::Alert, label: "Will expire soon:", severity: Severity::Critical },
    BucketDetail { kind: OutcomeKind::Expired, label: "Already expired:", severity: Severity::Critical },
];
