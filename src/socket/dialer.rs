//! Dialers.
//!
//! The [`Dialer`] trait plus the leaf implementations: [`SystemDialer`] talks to
//! the network over TCP or connected UDP, [`NullDialer`] and [`SingleUseDialer`] stand in for it.
//! Use [`wrap_dialer`](super::wrap_dialer) to get the full resolving,
//! logging and error-wrapping stack.

use crate::base::neterror::NetError;
use crate::socket::stream::{BoxedConn, DatagramConn};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};

/// Upper bound on a single TCP connect attempt.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Establishes connections to `address` over `network`.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError>;

    fn close_idle_connections(&self) {}
}

#[async_trait]
impl<D: Dialer + ?Sized> Dialer for Arc<D> {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError> {
        (**self).dial(network, address).await
    }

    fn close_idle_connections(&self) {
        (**self).close_idle_connections()
    }
}

/// Shared dialer handle.
pub type SharedDialer = Arc<dyn Dialer>;

/// Connects to a literal `ip:port` endpoint over TCP or UDP.
#[derive(Debug, Clone)]
pub struct SystemDialer {
    timeout: Duration,
}

impl Default for SystemDialer {
    fn default() -> Self {
        Self {
            timeout: TCP_CONNECT_TIMEOUT,
        }
    }
}

impl SystemDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the TCP connect timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parses `address` as `ip:port` and checks it against `network`.
pub(crate) fn endpoint_for(network: &str, address: &str) -> Result<SocketAddr, NetError> {
    let addr = address
        .parse::<SocketAddr>()
        .map_err(|e| NetError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
    let mismatch = match network {
        "tcp" | "udp" => false,
        "tcp4" | "udp4" => !addr.is_ipv4(),
        "tcp6" | "udp6" => !addr.is_ipv6(),
        other => return Err(NetError::UnsupportedNetwork(other.to_string())),
    };
    if mismatch {
        return Err(NetError::InvalidAddress {
            address: address.to_string(),
            reason: format!("address family does not match network {network}"),
        });
    }
    Ok(addr)
}

#[async_trait]
impl Dialer for SystemDialer {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError> {
        let addr = endpoint_for(network, address)?;
        if network.starts_with("udp") {
            let local: SocketAddr = match addr {
                SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
                SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
            };
            let socket = UdpSocket::bind(local).await?;
            socket.connect(addr).await?;
            tracing::trace!(peer = %addr, "udp connected");
            return Ok(BoxedConn::new(DatagramConn::new(socket)));
        }
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await??;
        stream.set_nodelay(true)?;
        tracing::trace!(peer = %addr, "tcp connected");
        Ok(BoxedConn::new(stream))
    }
}

/// Fails every dial.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDialer;

#[async_trait]
impl Dialer for NullDialer {
    async fn dial(&self, _network: &str, _address: &str) -> Result<BoxedConn, NetError> {
        Err(NetError::NoDialer)
    }
}

/// Returns a pre-built connection once, then behaves like [`NullDialer`].
#[derive(Debug)]
pub struct SingleUseDialer {
    conn: Mutex<Option<BoxedConn>>,
}

impl SingleUseDialer {
    pub fn new(conn: BoxedConn) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }
}

#[async_trait]
impl Dialer for SingleUseDialer {
    async fn dial(&self, _network: &str, _address: &str) -> Result<BoxedConn, NetError> {
        let conn = match self.conn.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        conn.ok_or(NetError::NoDialer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_dialer_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let conn = SystemDialer::new()
            .dial("tcp", &addr.to_string())
            .await
            .unwrap();
        use crate::socket::stream::Conn;
        assert_eq!(conn.peer_addr(), Some(addr));
    }

    #[tokio::test]
    async fn test_tcp_dialer_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = SystemDialer::new()
            .dial("tcp", &addr.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Io(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_system_dialer_rejects_network() {
        let dialer = SystemDialer::new();
        assert!(matches!(
            dialer.dial("unix", "127.0.0.1:53").await,
            Err(NetError::UnsupportedNetwork(_))
        ));
        assert!(matches!(
            dialer.dial("udp4", "[::1]:53").await,
            Err(NetError::InvalidAddress { .. })
        ));
        assert!(matches!(
            dialer.dial("tcp6", "127.0.0.1:53").await,
            Err(NetError::InvalidAddress { .. })
        ));
        assert!(matches!(
            dialer.dial("tcp", "example.com:80").await,
            Err(NetError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_udp_dial_connects_socket() {
        let server = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let mut conn = SystemDialer::new()
            .dial("udp", &addr.to_string())
            .await
            .unwrap();
        use crate::socket::stream::Conn;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        assert_eq!(conn.peer_addr(), Some(addr));

        conn.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, peer) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(conn.local_addr().map(|a| a.port()), Some(peer.port()));

        server.send_to(b"pong", peer).await.unwrap();
        let n = conn.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn test_null_dialer() {
        let err = NullDialer.dial("tcp", "1.1.1.1:443").await.unwrap_err();
        assert_eq!(err.to_string(), "no configured dialer");
    }

    #[tokio::test]
    async fn test_single_use_dialer() {
        let (a, _b) = tokio::io::duplex(16);
        let dialer = SingleUseDialer::new(BoxedConn::new(a));
        assert!(dialer.dial("tcp", "1.1.1.1:443").await.is_ok());
        assert!(matches!(
            dialer.dial("tcp", "1.1.1.1:443").await,
            Err(NetError::NoDialer)
        ));
    }
}
