//! TLS handshakers.
//!
//! [`BoringHandshaker`] runs the client handshake with BoringSSL. The
//! [`ErrWrapHandshaker`] and [`LoggingHandshaker`] layers classify and log
//! it; [`wrap_tls_handshaker`] stacks them in the fixed order.

use super::{tls_cipher_suite_string, tls_version_string, RootStore, TlsConfig};
use crate::base::classify::classify_tls_handshake_error;
use crate::base::errwrapper::ResultExt;
use crate::base::logger::{DisplayList, SharedLogger};
use crate::base::neterror::{NetError, TlsError};
use crate::base::operation::Operation;
use crate::socket::stream::BoxedConn;
use async_trait::async_trait;
use boring::ssl::{ErrorCode, SslRef};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on a TLS handshake, independent of the caller's deadline.
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// X509_V_ERR_* codes.
const X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT: i32 = 2;
const X509_V_ERR_DEPTH_ZERO_SELF_SIGNED_CERT: i32 = 18;
const X509_V_ERR_SELF_SIGNED_CERT_IN_CHAIN: i32 = 19;
const X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT_LOCALLY: i32 = 20;
const X509_V_ERR_UNABLE_TO_VERIFY_LEAF_SIGNATURE: i32 = 21;
const X509_V_ERR_HOSTNAME_MISMATCH: i32 = 62;
const X509_V_ERR_IP_ADDRESS_MISMATCH: i32 = 64;

/// What a completed handshake negotiated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConnectionState {
    pub server_name: String,
    pub version: String,
    pub cipher_suite: String,
    pub negotiated_protocol: String,
    /// DER encoding of the certificates sent by the peer, leaf first.
    pub peer_certificates: Vec<Vec<u8>>,
}

impl TlsConnectionState {
    fn from_ssl(ssl: &SslRef, server_name: &str) -> Self {
        let peer_certificates = ssl
            .peer_cert_chain()
            .map(|chain| chain.iter().filter_map(|cert| cert.to_der().ok()).collect())
            .unwrap_or_default();
        Self {
            server_name: server_name.to_string(),
            version: tls_version_string(ssl.version2()),
            cipher_suite: tls_cipher_suite_string(ssl.current_cipher()),
            negotiated_protocol: ssl
                .selected_alpn_protocol()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .unwrap_or_default(),
            peer_certificates,
        }
    }
}

/// Runs a TLS client handshake over an established connection.
#[async_trait]
pub trait TlsHandshaker: Send + Sync {
    async fn handshake(
        &self,
        conn: BoxedConn,
        config: &TlsConfig,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError>;
}

#[async_trait]
impl<H: TlsHandshaker + ?Sized> TlsHandshaker for Arc<H> {
    async fn handshake(
        &self,
        conn: BoxedConn,
        config: &TlsConfig,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        (**self).handshake(conn, config).await
    }
}

/// Shared handshaker handle.
pub type SharedTlsHandshaker = Arc<dyn TlsHandshaker>;

/// BoringSSL client handshake.
#[derive(Debug, Clone)]
pub struct BoringHandshaker {
    default_roots: RootStore,
    timeout: Duration,
}

impl BoringHandshaker {
    /// Uses the bundled roots when a config does not carry its own.
    pub fn new() -> Result<Self, NetError> {
        Ok(Self::with_roots(RootStore::bundled()?))
    }

    pub fn with_roots(default_roots: RootStore) -> Self {
        Self {
            default_roots,
            timeout: TLS_HANDSHAKE_TIMEOUT,
        }
    }

    /// Overrides the handshake timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn verify_error(ssl: &SslRef) -> Option<TlsError> {
    let err = ssl.verify_result().err()?;
    let message = err.error_string().to_string();
    let tls_err = match err.as_raw() {
        X509_V_ERR_HOSTNAME_MISMATCH | X509_V_ERR_IP_ADDRESS_MISMATCH => {
            TlsError::HostnameMismatch(message)
        }
        X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT
        | X509_V_ERR_DEPTH_ZERO_SELF_SIGNED_CERT
        | X509_V_ERR_SELF_SIGNED_CERT_IN_CHAIN
        | X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT_LOCALLY
        | X509_V_ERR_UNABLE_TO_VERIFY_LEAF_SIGNATURE => TlsError::UnknownAuthority(message),
        _ => TlsError::InvalidCertificate(message),
    };
    Some(tls_err)
}

fn handshake_error(err: tokio_boring::HandshakeError<BoxedConn>) -> NetError {
    if let Some(tls_err) = err.ssl().and_then(verify_error) {
        return NetError::Tls(tls_err);
    }
    if let Some(io_err) = err.as_io_error() {
        let copy = match io_err.raw_os_error() {
            Some(code) => io::Error::from_raw_os_error(code),
            None => io::Error::new(io_err.kind(), io_err.to_string()),
        };
        return NetError::from(copy);
    }
    if err.code() == Some(ErrorCode::SYSCALL) || err.code() == Some(ErrorCode::ZERO_RETURN) {
        // The peer closed the connection mid-handshake.
        return NetError::Eof;
    }
    NetError::Tls(TlsError::Handshake(err.to_string()))
}

#[async_trait]
impl TlsHandshaker for BoringHandshaker {
    async fn handshake(
        &self,
        conn: BoxedConn,
        config: &TlsConfig,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        let server_name = config.server_name.clone().unwrap_or_default();
        if server_name.is_empty() && !config.insecure_skip_verify {
            return Err(NetError::Tls(TlsError::Config(
                "either server name or insecure_skip_verify must be set".to_string(),
            )));
        }
        let roots = config.root_certs.as_ref().unwrap_or(&self.default_roots);
        let connector = config.connector(roots)?;
        let mut ssl = connector
            .configure()
            .map_err(|e| NetError::Tls(TlsError::Config(e.to_string())))?;
        if config.insecure_skip_verify {
            ssl.set_verify_hostname(false);
        }
        if server_name.is_empty() {
            ssl.set_use_server_name_indication(false);
        }

        let handshake = tokio_boring::connect(ssl, &server_name, conn);
        let stream = tokio::time::timeout(self.timeout, handshake)
            .await?
            .map_err(handshake_error)?;
        let state = TlsConnectionState::from_ssl(stream.ssl(), &server_name);
        Ok((BoxedConn::new(stream), state))
    }
}

/// Classifies handshake failures with [`Operation::TlsHandshake`].
pub struct ErrWrapHandshaker {
    handshaker: SharedTlsHandshaker,
}

impl ErrWrapHandshaker {
    pub fn new(handshaker: SharedTlsHandshaker) -> Self {
        Self { handshaker }
    }
}

#[async_trait]
impl TlsHandshaker for ErrWrapHandshaker {
    async fn handshake(
        &self,
        conn: BoxedConn,
        config: &TlsConfig,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        self.handshaker
            .handshake(conn, config)
            .await
            .wrap_err(classify_tls_handshake_error, Operation::TlsHandshake)
    }
}

/// Logs the start and outcome of every handshake.
pub struct LoggingHandshaker {
    handshaker: SharedTlsHandshaker,
    logger: SharedLogger,
}

impl LoggingHandshaker {
    pub fn new(handshaker: SharedTlsHandshaker, logger: SharedLogger) -> Self {
        Self { handshaker, logger }
    }
}

#[async_trait]
impl TlsHandshaker for LoggingHandshaker {
    async fn handshake(
        &self,
        conn: BoxedConn,
        config: &TlsConfig,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        let sni = config.server_name.as_deref().unwrap_or_default();
        let next = DisplayList(&config.alpn_protocols);
        self.logger.debug(&format!("tls {{sni={sni} next={next}}}..."));
        let start = Instant::now();
        let result = self.handshaker.handshake(conn, config).await;
        let elapsed = start.elapsed();
        match &result {
            Ok((_, state)) => self.logger.debug(&format!(
                "tls {{sni={sni} next={next}}}... ok in {elapsed:?} {{next={} cipher={} v={}}}",
                state.negotiated_protocol, state.cipher_suite, state.version
            )),
            Err(err) => self.logger.debug(&format!(
                "tls {{sni={sni} next={next}}}... {err} in {elapsed:?}"
            )),
        }
        result
    }
}

/// Stacks the logging and error-wrapping layers on top of `handshaker`.
pub fn wrap_tls_handshaker(
    handshaker: SharedTlsHandshaker,
    logger: SharedLogger,
) -> SharedTlsHandshaker {
    Arc::new(LoggingHandshaker::new(
        Arc::new(ErrWrapHandshaker::new(handshaker)),
        logger,
    ))
}

/// Full handshaker stack over [`BoringHandshaker`] with the bundled roots.
pub fn new_tls_handshaker(logger: SharedLogger) -> Result<SharedTlsHandshaker, NetError> {
    Ok(wrap_tls_handshaker(Arc::new(BoringHandshaker::new()?), logger))
}


#[cfg(test)]
mod tests {
    use super::testing::{self_signed, spawn_tls_server};
    use super::*;
    use crate::base::failure::Failure;
    use crate::base::logger::testing::RecordingLogger;
    use tokio::net::TcpStream;

    async fn connect(addr: std::net::SocketAddr) -> BoxedConn {
        BoxedConn::new(TcpStream::connect(addr).await.unwrap())
    }

    fn roots_for(cert_pem: &str) -> RootStore {
        RootStore::from_pem(cert_pem.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_succeeds() {
        let (cert, key) = self_signed(&["localhost"]);
        let addr = spawn_tls_server(&cert, &key).await;
        let config = TlsConfig::new()
            .server_name("localhost")
            .alpn_protocols(["h2", "http/1.1"])
            .root_certs(roots_for(&cert));

        let handshaker = BoringHandshaker::new().unwrap();
        let (_, state) = handshaker.handshake(connect(addr).await, &config).await.unwrap();
        assert_eq!(state.negotiated_protocol, "h2");
        assert_eq!(state.server_name, "localhost");
        assert!(state.version.starts_with("TLSv1."));
        assert!(!state.cipher_suite.is_empty());
        assert_eq!(state.peer_certificates.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_authority() {
        let (cert, key) = self_signed(&["localhost"]);
        let addr = spawn_tls_server(&cert, &key).await;
        let config = TlsConfig::new().server_name("localhost");

        let handshaker = wrap_tls_handshaker(
            Arc::new(BoringHandshaker::new().unwrap()),
            Arc::new(RecordingLogger::default()),
        );
        let err = handshaker
            .handshake(connect(addr).await, &config)
            .await
            .unwrap_err();
        let wrapped = err.as_wrapped().expect("wrapped");
        assert_eq!(wrapped.failure(), &Failure::SslUnknownAuthority);
        assert_eq!(wrapped.operation(), Operation::TlsHandshake);
    }

    #[tokio::test]
    async fn test_hostname_mismatch() {
        let (cert, key) = self_signed(&["localhost"]);
        let addr = spawn_tls_server(&cert, &key).await;
        let config = TlsConfig::new()
            .server_name("example.com")
            .root_certs(roots_for(&cert));

        let handshaker = ErrWrapHandshaker::new(Arc::new(BoringHandshaker::new().unwrap()));
        let err = handshaker
            .handshake(connect(addr).await, &config)
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::SslInvalidHostname));
    }

    #[tokio::test]
    async fn test_insecure_skip_verify() {
        let (cert, key) = self_signed(&["localhost"]);
        let addr = spawn_tls_server(&cert, &key).await;
        let config = TlsConfig::new()
            .server_name("example.com")
            .insecure_skip_verify(true);

        let handshaker = BoringHandshaker::new().unwrap();
        let (_, state) = handshaker.handshake(connect(addr).await, &config).await.unwrap();
        assert!(state.negotiated_protocol.is_empty());
    }

    #[tokio::test]
    async fn test_requires_server_name() {
        let (a, _b) = tokio::io::duplex(64);
        let err = BoringHandshaker::new()
            .unwrap()
            .handshake(BoxedConn::new(a), &TlsConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Tls(TlsError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_timeout() {
        // The peer never answers the ClientHello.
        let (a, _b) = tokio::io::duplex(4096);
        let handshaker = ErrWrapHandshaker::new(Arc::new(BoringHandshaker::new().unwrap()));
        let config = TlsConfig::new().server_name("dns.google");
        let err = handshaker
            .handshake(BoxedConn::new(a), &config)
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(&Failure::GenericTimeout));
    }

    #[tokio::test]
    async fn test_peer_closes_mid_handshake() {
        let (a, b) = tokio::io::duplex(4096);
        drop(b);
        let handshaker = ErrWrapHandshaker::new(Arc::new(BoringHandshaker::new().unwrap()));
        let config = TlsConfig::new().server_name("dns.google");
        let err = handshaker
            .handshake(BoxedConn::new(a), &config)
            .await
            .unwrap_err();
        assert!(err.failure().is_some());
    }

    #[tokio::test]
    async fn test_logging() {
        let (cert, key) = self_signed(&["localhost"]);
        let addr = spawn_tls_server(&cert, &key).await;
        let logger = Arc::new(RecordingLogger::default());
        let handshaker = wrap_tls_handshaker(
            Arc::new(BoringHandshaker::with_roots(roots_for(&cert))),
            logger.clone(),
        );
        let config = TlsConfig::new().server_name("localhost").alpn_protocols(["dot"]);
        handshaker.handshake(connect(addr).await, &config).await.unwrap();

        let lines = logger.lines();
        assert_eq!(lines[0], "tls {sni=localhost next=[dot]}...");
        assert!(lines[1].contains("ok in"));
        assert!(lines[1].contains("{next=dot cipher="));
    }
}
