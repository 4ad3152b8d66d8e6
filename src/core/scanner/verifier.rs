// src/core/scanner/verifier.rs

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{VerifierBuilderError, WebPkiServerVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, Error, OtherError, RootCertStore, SignatureScheme};
use thiserror::Error as ThisError;
use tracing::debug;
use x509_parser::prelude::*;

/// Raised by [`ClassifyingVerifier`] when a certificate cannot be anchored and
/// names itself as its own issuer.
#[derive(Debug, ThisError)]
#[error("certificate issuer equals its subject")]
pub struct SelfSignedCertificate;

/// Standard web-PKI verification that tags the two failures the report cares
/// about with a fixed discriminant.
///
/// * an end-entity certificate past its `notAfter` is always reported as
///   `CertificateError::Expired`, whatever order the chain checks ran in;
/// * an unknown issuer becomes `CertificateError::Other(SelfSignedCertificate)`
///   when the leaf is self-issued or the chain the server sent ends in a
///   self-issued root.
///
/// Everything else is passed through untouched.
#[derive(Debug)]
pub struct ClassifyingVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ClassifyingVerifier {
    pub fn new(roots: RootCertStore, provider: Arc<CryptoProvider>) -> Result<Self, VerifierBuilderError> {
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider).build()?;
        Ok(Self { inner })
    }
}

impl ServerCertVerifier for ClassifyingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .map_err(|e| refine(e, end_entity, intermediates, now))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn refine(error: Error, end_entity: &CertificateDer<'_>, intermediates: &[CertificateDer<'_>], now: UnixTime) -> Error {
    let Error::InvalidCertificate(cert_error) = error else {
        return error;
    };
    let Ok((_, leaf)) = parse_x509_certificate(end_entity.as_ref()) else {
        return Error::InvalidCertificate(cert_error);
    };

    let now_secs = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
    if leaf.validity().not_after.timestamp() < now_secs {
        debug!(subject = %leaf.subject(), "Leaf certificate is past notAfter.");
        return Error::InvalidCertificate(CertificateError::Expired);
    }

    if matches!(cert_error, CertificateError::UnknownIssuer)
        && (is_self_issued(&leaf) || chain_ends_self_issued(intermediates))
    {
        debug!(subject = %leaf.subject(), "Unanchored chain is self-signed.");
        return Error::InvalidCertificate(CertificateError::Other(OtherError(Arc::new(SelfSignedCertificate))));
    }

    Error::InvalidCertificate(cert_error)
}

fn is_self_issued(cert: &X509Certificate<'_>) -> bool {
    cert.issuer().as_raw() == cert.subject().as_raw()
}

/// Whether the last certificate the server sent is a self-issued root.
fn chain_ends_self_issued(intermediates: &[CertificateDer<'_>]) -> bool {
    intermediates
        .last()
        .and_then(|der| parse_x509_certificate(der.as_ref()).ok())
        .is_some_and(|(_, cert)| is_self_issued(&cert))
}

/// Whether a rustls error carries the self-signed marker raised above.
pub fn is_self_signed(error: &Error) -> bool {
    match error {
        Error::InvalidCertificate(CertificateError::Other(other)) => {
            other.0.downcast_ref::<SelfSignedCertificate>().is_some()
        }
        _ => false,
    }
}
