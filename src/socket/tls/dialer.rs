//! TLS dialer: a plain dial followed by a TLS handshake.

use super::handshaker::{SharedTlsHandshaker, TlsConnectionState};
use super::{default_alpn_for_port, TlsConfig};
use crate::base::neterror::NetError;
use crate::socket::address::split_host_port;
use crate::socket::dialer::SharedDialer;
use crate::socket::stream::BoxedConn;
use async_trait::async_trait;
use std::sync::Arc;

/// Establishes TLS connections.
#[async_trait]
pub trait TlsDialer: Send + Sync {
    /// Dials `address` over `network` and runs the TLS handshake.
    async fn dial_tls(
        &self,
        network: &str,
        address: &str,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError>;

    fn close_idle_connections(&self) {}
}

#[async_trait]
impl<D: TlsDialer + ?Sized> TlsDialer for Arc<D> {
    async fn dial_tls(
        &self,
        network: &str,
        address: &str,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        (**self).dial_tls(network, address).await
    }

    fn close_idle_connections(&self) {
        (**self).close_idle_connections()
    }
}

/// Shared TLS dialer handle.
pub type SharedTlsDialer = Arc<dyn TlsDialer>;

/// Dials with a [`Dialer`](crate::socket::Dialer) and hands the connection
/// to a [`TlsHandshaker`](super::TlsHandshaker).
pub struct TlsStdDialer {
    dialer: SharedDialer,
    handshaker: SharedTlsHandshaker,
    config: TlsConfig,
}

impl TlsStdDialer {
    pub fn new(dialer: SharedDialer, handshaker: SharedTlsHandshaker, config: TlsConfig) -> Self {
        Self {
            dialer,
            handshaker,
            config,
        }
    }

    /// Per-connection copy of the config with the server name and ALPN
    /// filled in when unset.
    pub fn config_for(&self, host: &str, port: u16) -> TlsConfig {
        let mut config = self.config.clone();
        if config.alpn_protocols.is_empty() {
            config.alpn_protocols = default_alpn_for_port(port);
        }
        if config.server_name.as_deref().map_or(true, str::is_empty) {
            config.server_name = Some(host.to_string());
        }
        config
    }
}

#[async_trait]
impl TlsDialer for TlsStdDialer {
    async fn dial_tls(
        &self,
        network: &str,
        address: &str,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        let (host, port) = split_host_port(address)?;
        let conn = self.dialer.dial(network, address).await?;
        let config = self.config_for(&host, port);
        // On failure the handshaker drops, and thereby closes, the connection.
        self.handshaker.handshake(conn, &config).await
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}

/// Fails every dial.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTlsDialer;

#[async_trait]
impl TlsDialer for NullTlsDialer {
    async fn dial_tls(
        &self,
        _network: &str,
        _address: &str,
    ) -> Result<(BoxedConn, TlsConnectionState), NetError> {
        Err(NetError::NoDialer)
    }
}

/// Builds a TLS dialer over `dialer` and `handshaker`.
pub fn new_tls_dialer(
    dialer: SharedDialer,
    handshaker: SharedTlsHandshaker,
    config: TlsConfig,
) -> SharedTlsDialer {
    Arc::new(TlsStdDialer::new(dialer, handshaker, config))
}
