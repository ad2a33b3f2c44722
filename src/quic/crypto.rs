//! rustls client configuration for QUIC.
//!
//! BoringSSL drives TCP handshakes; QUIC goes through quinn, which speaks
//! rustls. The same [`TlsConfig`] feeds both.

use crate::base::neterror::{NetError, TlsError};
use crate::quic::config::QuicConfig;
use crate::socket::tls::TlsConfig;
use quinn::crypto::rustls::QuicClientConfig;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;

fn config_err(reason: impl std::fmt::Display) -> NetError {
    NetError::Tls(TlsError::Config(reason.to_string()))
}

/// Trust anchors for `config`: its own roots converted to DER, or the
/// Mozilla set from `webpki-roots`.
fn root_store(config: &TlsConfig) -> Result<RootCertStore, NetError> {
    let Some(roots) = &config.root_certs else {
        return Ok(RootCertStore::from_iter(
            webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
        ));
    };
    let mut store = RootCertStore::empty();
    for cert in roots.certs() {
        let der = cert.to_der().map_err(config_err)?;
        if let Err(e) = store.add(CertificateDer::from(der)) {
            tracing::trace!(error = %e, "skipping root certificate");
        }
    }
    Ok(store)
}

/// Builds the quinn client configuration. QUIC mandates TLS 1.3, so the
/// version bounds of `tls` are ignored.
pub(crate) fn client_config(
    tls: &TlsConfig,
    quic: &QuicConfig,
) -> Result<quinn::ClientConfig, NetError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(config_err)?;
    let mut crypto = if tls.insecure_skip_verify {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(root_store(tls)?)
            .with_no_client_auth()
    };
    crypto.alpn_protocols = tls
        .alpn_protocols
        .iter()
        .map(|p| p.as_bytes().to_vec())
        .collect();

    let crypto = QuicClientConfig::try_from(crypto).map_err(config_err)?;
    let mut config = quinn::ClientConfig::new(Arc::new(crypto));
    config.transport_config(Arc::new(quic.transport_config()?));
    Ok(config)
}

/// Accepts any certificate and any handshake signature.
#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
