//! QUIC dialers.
//!
//! [`QuinnDialer`] performs one handshake with a literal `ip:port`. The
//! other types layer resolution, logging and error wrapping on top;
//! [`wrap_quic_dialer`] assembles them.

use super::config::{default_quic_alpn_for_port, QuicConfig};
use super::connection::QuicConnection;
use super::crypto::client_config;
use super::listener::{new_udp_listener, SharedUdpListener};
use crate::base::classify::classify_quic_handshake_error;
use crate::base::errwrapper::ResultExt;
use crate::base::logger::{DisplayList, SharedLogger};
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use crate::dns::SharedResolver;
use crate::socket::address::{join_host_port, split_host_port};
use crate::socket::dialer::endpoint_for;
use crate::socket::resolving::{lookup, reduce_errors};
use crate::socket::tls::TlsConfig;
use async_trait::async_trait;
use quinn::{Endpoint, EndpointConfig, TokioRuntime};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

/// Establishes QUIC connections.
#[async_trait]
pub trait QuicDialer: Send + Sync {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError>;

    fn close_idle_connections(&self) {}
}

#[async_trait]
impl<D: QuicDialer + ?Sized> QuicDialer for Arc<D> {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        (**self).dial_quic(network, address, tls, quic).await
    }

    fn close_idle_connections(&self) {
        (**self).close_idle_connections()
    }
}

/// Shared QUIC dialer handle.
pub type SharedQuicDialer = Arc<dyn QuicDialer>;

/// Per-connection copy of `tls` with the server name and ALPN filled in
/// when unset.
pub fn quic_config_for(tls: &TlsConfig, host: &str, port: u16) -> TlsConfig {
    let mut config = tls.clone();
    if config.alpn_protocols.is_empty() {
        config.alpn_protocols = default_quic_alpn_for_port(port);
    }
    if config.server_name.as_deref().map_or(true, str::is_empty) {
        config.server_name = Some(host.to_string());
    }
    config
}

/// Handshakes with a literal `ip:port` over a fresh UDP socket.
pub struct QuinnDialer {
    listener: SharedUdpListener,
}

impl Default for QuinnDialer {
    fn default() -> Self {
        Self::new(new_udp_listener())
    }
}

impl QuinnDialer {
    /// Opens the per-attempt sockets through `listener`.
    pub fn new(listener: SharedUdpListener) -> Self {
        Self { listener }
    }
}

#[async_trait]
impl QuicDialer for QuinnDialer {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        if !matches!(network, "udp" | "udp4" | "udp6") {
            return Err(NetError::UnsupportedNetwork(network.to_string()));
        }
        let remote = endpoint_for(network, address)?;
        let (host, port) = split_host_port(address)?;
        let tls = quic_config_for(tls, &host, port);
        let server_name = tls.server_name.clone().unwrap_or(host);
        let config = client_config(&tls, quic)?;

        let bind: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = self.listener.listen(bind).await?.into_std()?;
        let endpoint = Endpoint::new(
            EndpointConfig::default(),
            None,
            socket,
            Arc::new(TokioRuntime),
        )?;

        let connecting = match endpoint.connect_with(config, remote, &server_name) {
            Ok(connecting) => connecting,
            Err(e) => {
                endpoint.close(0u32.into(), b"");
                return Err(NetError::QuicConnect(e.to_string()));
            }
        };
        match connecting.await {
            Ok(connection) => {
                tracing::trace!(peer = %remote, sni = %server_name, "quic connected");
                Ok(QuicConnection::new(endpoint, connection, server_name))
            }
            Err(e) => {
                endpoint.close(0u32.into(), b"");
                Err(e.into())
            }
        }
    }
}

/// Fails every dial.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQuicDialer;

#[async_trait]
impl QuicDialer for NullQuicDialer {
    async fn dial_quic(
        &self,
        _network: &str,
        _address: &str,
        _tls: &TlsConfig,
        _quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        Err(NetError::NoDialer)
    }
}

/// Wraps handshake failures with [`Operation::QuicHandshake`].
pub struct ErrWrapQuicDialer {
    dialer: SharedQuicDialer,
}

impl ErrWrapQuicDialer {
    pub fn new(dialer: SharedQuicDialer) -> Self {
        Self { dialer }
    }
}

#[async_trait]
impl QuicDialer for ErrWrapQuicDialer {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        self.dialer
            .dial_quic(network, address, tls, quic)
            .await
            .wrap_err(classify_quic_handshake_error, Operation::QuicHandshake)
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}

/// Logs the start and outcome of every dial.
pub struct LoggingQuicDialer {
    dialer: SharedQuicDialer,
    logger: SharedLogger,
    operation: &'static str,
}

impl LoggingQuicDialer {
    /// Logs with the `quic_dial` prefix.
    pub fn new(dialer: SharedQuicDialer, logger: SharedLogger) -> Self {
        Self::with_operation(dialer, logger, "quic_dial")
    }

    pub fn with_operation(
        dialer: SharedQuicDialer,
        logger: SharedLogger,
        operation: &'static str,
    ) -> Self {
        Self {
            dialer,
            logger,
            operation,
        }
    }
}

#[async_trait]
impl QuicDialer for LoggingQuicDialer {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        let op = self.operation;
        self.logger.debug(&format!("{op} {address}/{network}..."));
        let start = Instant::now();
        let result = self.dialer.dial_quic(network, address, tls, quic).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(conn) => self.logger.debug(&format!(
                "{op} {address}/{network}... ok in {elapsed:?} {{next={}}}",
                conn.negotiated_protocol()
            )),
            Err(err) => self.logger.debug(&format!(
                "{op} {address}/{network}... {err} in {elapsed:?} {{next={}}}",
                DisplayList(&tls.alpn_protocols)
            )),
        }
        result
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}

/// Resolves the host part of the address, fills in the TLS defaults from
/// the hostname, and tries every returned address in order.
pub struct ResolvingQuicDialer {
    dialer: SharedQuicDialer,
    resolver: SharedResolver,
}

impl ResolvingQuicDialer {
    pub fn new(dialer: SharedQuicDialer, resolver: SharedResolver) -> Self {
        Self { dialer, resolver }
    }
}

#[async_trait]
impl QuicDialer for ResolvingQuicDialer {
    async fn dial_quic(
        &self,
        network: &str,
        address: &str,
        tls: &TlsConfig,
        quic: &QuicConfig,
    ) -> Result<QuicConnection, NetError> {
        let (host, port) = split_host_port(address)?;
        let addrs = lookup(&self.resolver, &host).await?;
        let tls = quic_config_for(tls, &host, port);
        let mut errors = Vec::with_capacity(addrs.len());
        for ip in addrs {
            let target = join_host_port(&ip.to_string(), port);
            match self.dialer.dial_quic(network, &target, &tls, quic).await {
                Ok(conn) => return Ok(conn),
                Err(err) => errors.push(err),
            }
        }
        Err(reduce_errors(errors))
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections();
        self.resolver.close_idle_connections();
    }
}

/// Stacks `Logging(Resolving(Logging(ErrWrap(base))))`.
pub fn wrap_quic_dialer(
    base: SharedQuicDialer,
    resolver: SharedResolver,
    logger: SharedLogger,
) -> SharedQuicDialer {
    let per_address: SharedQuicDialer = Arc::new(LoggingQuicDialer::with_operation(
        Arc::new(ErrWrapQuicDialer::new(base)),
        logger.clone(),
        "quic_dial_address",
    ));
    Arc::new(LoggingQuicDialer::new(
        Arc::new(ResolvingQuicDialer::new(per_address, resolver)),
        logger,
    ))
}

/// Full QUIC dialer stack over [`QuinnDialer`].
pub fn new_quic_dialer(resolver: SharedResolver, logger: SharedLogger) -> SharedQuicDialer {
    wrap_quic_dialer(Arc::new(QuinnDialer::default()), resolver, logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::failure::Failure;
    use crate::base::logger::testing::RecordingLogger;
    use crate::dns::testing::MockResolver;
    use crate::dns::NullResolver;
    use crate::quic::crypto::testing::spawn_quic_server;
    use crate::socket::tls::RootStore;
    use std::sync::Mutex;
    use std::time::Duration;

    fn trusting(cert_pem: &str) -> TlsConfig {
        TlsConfig::new()
            .server_name("localhost")
            .alpn_protocols(["h3"])
            .root_certs(RootStore::from_pem(cert_pem.as_bytes()).unwrap())
    }

    fn short() -> QuicConfig {
        QuicConfig::new().idle_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_quic_config_for_defaults() {
        let config = quic_config_for(&TlsConfig::new(), "dns.adguard.com", 8853);
        assert_eq!(config.alpn_protocols, vec!["dq"]);
        assert_eq!(config.server_name.as_deref(), Some("dns.adguard.com"));

        let config = quic_config_for(&TlsConfig::new(), "www.google.com", 443);
        assert_eq!(config.alpn_protocols, vec!["h3"]);

        let explicit = TlsConfig::new().server_name("x.example").alpn_protocols(["h3-29"]);
        let config = quic_config_for(&explicit, "www.google.com", 443);
        assert_eq!(config.alpn_protocols, vec!["h3-29"]);
        assert_eq!(config.server_name.as_deref(), Some("x.example"));
    }

    #[tokio::test]
    async fn test_handshake_and_echo() {
        let (addr, cert) = spawn_quic_server(&["h3"]).await;
        let conn = QuinnDialer::default()
            .dial_quic("udp", &addr.to_string(), &trusting(&cert), &short())
            .await
            .unwrap();
        assert_eq!(conn.remote_address(), addr);
        assert_eq!(conn.negotiated_protocol(), "h3");
        assert_eq!(conn.server_name(), "localhost");

        let (mut send, mut recv) = conn.open_bi().await.unwrap();
        send.write_all(b"hello").await.unwrap();
        send.finish().unwrap();
        let echoed = recv.read_to_end(1024).await.unwrap();
        assert_eq!(echoed, b"hello");
        conn.close();
    }

    #[tokio::test]
    async fn test_unknown_authority() {
        let (addr, _cert) = spawn_quic_server(&["h3"]).await;
        let tls = TlsConfig::new().server_name("localhost").alpn_protocols(["h3"]);
        let dialer = ErrWrapQuicDialer::new(Arc::new(QuinnDialer::default()));
        let err = dialer
            .dial_quic("udp", &addr.to_string(), &tls, &short())
            .await
            .unwrap_err();
        let wrapped = err.as_wrapped().expect("wrapped");
        assert_eq!(wrapped.operation(), Operation::QuicHandshake);
        assert_eq!(wrapped.failure(), &Failure::SslUnknownAuthority);
    }

    #[tokio::test]
    async fn test_insecure_skip_verify() {
        let (addr, _cert) = spawn_quic_server(&["h3"]).await;
        let tls = TlsConfig::new()
            .server_name("not-localhost.example")
            .alpn_protocols(["h3"])
            .insecure_skip_verify(true);
        let conn = QuinnDialer::default()
            .dial_quic("udp", &addr.to_string(), &tls, &short())
            .await
            .unwrap();
        conn.shutdown().await;
    }

    #[tokio::test]
    async fn test_base_dialer_rejects_bad_input() {
        let dialer = QuinnDialer::default();
        let tls = TlsConfig::new();
        let quic = QuicConfig::new();
        assert!(matches!(
            dialer.dial_quic("tcp", "127.0.0.1:443", &tls, &quic).await,
            Err(NetError::UnsupportedNetwork(_))
        ));
        assert!(matches!(
            dialer.dial_quic("udp", "localhost:443", &tls, &quic).await,
            Err(NetError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_null_dialer() {
        let err = NullQuicDialer
            .dial_quic("udp", "1.1.1.1:443", &TlsConfig::new(), &QuicConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoDialer));
    }

    /// Records what each attempt received.
    #[derive(Default)]
    struct RecordingQuicDialer {
        attempts: Mutex<Vec<(String, Option<String>, Vec<String>)>>,
    }

    #[async_trait]
    impl QuicDialer for RecordingQuicDialer {
        async fn dial_quic(
            &self,
            _network: &str,
            address: &str,
            tls: &TlsConfig,
            _quic: &QuicConfig,
        ) -> Result<QuicConnection, NetError> {
            self.attempts.lock().unwrap().push((
                address.to_string(),
                tls.server_name.clone(),
                tls.alpn_protocols.clone(),
            ));
            Err(NetError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_resolving_fills_defaults_from_hostname() {
        let resolver = Arc::new(MockResolver::with_addrs(&["8.8.8.8", "8.8.4.4"]));
        let base = Arc::new(RecordingQuicDialer::default());
        let dialer = ResolvingQuicDialer::new(base.clone(), resolver);
        let err = dialer
            .dial_quic("udp", "dns.google:443", &TlsConfig::new(), &QuicConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Timeout));

        let attempts = base.attempts.lock().unwrap().clone();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].0, "8.8.8.8:443");
        assert_eq!(attempts[1].0, "8.8.4.4:443");
        for (_, sni, alpn) in attempts {
            assert_eq!(sni.as_deref(), Some("dns.google"));
            assert_eq!(alpn, vec!["h3"]);
        }
    }

    #[tokio::test]
    async fn test_wrapped_stack_logs_and_classifies() {
        let logger = Arc::new(RecordingLogger::default());
        let dialer = wrap_quic_dialer(
            Arc::new(RecordingQuicDialer::default()),
            Arc::new(NullResolver),
            logger.clone(),
        );
        let err = dialer
            .dial_quic("udp", "127.0.0.1:8853", &TlsConfig::new(), &QuicConfig::new())
            .await
            .unwrap_err();
        let wrapped = err.as_wrapped().expect("wrapped");
        assert_eq!(wrapped.operation(), Operation::QuicHandshake);
        assert_eq!(wrapped.failure(), &Failure::GenericTimeout);

        let lines = logger.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "quic_dial 127.0.0.1:8853/udp...");
        assert_eq!(lines[1], "quic_dial_address 127.0.0.1:8853/udp...");
        assert!(lines[2].starts_with("quic_dial_address 127.0.0.1:8853/udp... generic_timeout_error in "));
        assert!(lines[2].ends_with("{next=[dq]}"));
    }

    #[tokio::test]
    async fn test_new_quic_dialer_end_to_end() {
        let (addr, cert) = spawn_quic_server(&["h3"]).await;
        let dialer = new_quic_dialer(Arc::new(NullResolver), Arc::new(RecordingLogger::default()));
        let conn = dialer
            .dial_quic("udp", &addr.to_string(), &trusting(&cert), &short())
            .await
            .unwrap();
        assert_eq!(conn.negotiated_protocol(), "h3");
        conn.close();
    }
}
