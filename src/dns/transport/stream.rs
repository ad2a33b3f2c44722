//! DNS over TCP and DNS over TLS.
//!
//! Both use RFC 1035 section 4.2.2 framing: every message is preceded by
//! its length as a 16-bit big-endian integer.

use super::DnsTransport;
use crate::base::neterror::NetError;
use crate::dns::codec::{DnsQuery, DnsResponse};
use crate::socket::{BoxedConn, SharedDialer};
use crate::socket::tls::SharedTlsDialer;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Upper bound on dial plus exchange, independent of the caller's deadline.
pub const STREAM_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

enum Connector {
    Tcp(SharedDialer),
    Tls(SharedTlsDialer),
}

/// One connection per query over TCP or TLS.
pub struct StreamTransport {
    connector: Connector,
    address: String,
}

impl StreamTransport {
    /// DNS over TCP to `address` (`host:port`).
    pub fn tcp(dialer: SharedDialer, address: impl Into<String>) -> Self {
        Self {
            connector: Connector::Tcp(dialer),
            address: address.into(),
        }
    }

    /// DNS over TLS to `address` (`host:port`).
    pub fn tls(dialer: SharedTlsDialer, address: impl Into<String>) -> Self {
        Self {
            connector: Connector::Tls(dialer),
            address: address.into(),
        }
    }

    async fn connect(&self) -> Result<BoxedConn, NetError> {
        match &self.connector {
            Connector::Tcp(dialer) => dialer.dial("tcp", &self.address).await,
            Connector::Tls(dialer) => Ok(dialer.dial_tls("tcp", &self.address).await?.0),
        }
    }

    async fn exchange(&self, raw: &[u8]) -> Result<Vec<u8>, NetError> {
        let len = u16::try_from(raw.len())
            .map_err(|_| NetError::EncodeFailed("query too large".to_string()))?;
        let mut conn = self.connect().await?;

        let mut frame = Vec::with_capacity(raw.len() + 2);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(raw);
        conn.write_all(&frame).await?;
        conn.flush().await?;

        let reply_len = conn.read_u16().await?;
        let mut reply = vec![0u8; usize::from(reply_len)];
        conn.read_exact(&mut reply).await?;
        Ok(reply)
    }
}

#[async_trait]
impl DnsTransport for StreamTransport {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        let raw = query.encode(self.requires_padding())?;
        tracing::trace!(network = self.network(), address = %self.address, id = query.id(), "stream query");
        let reply = tokio::time::timeout(STREAM_EXCHANGE_TIMEOUT, self.exchange(&raw)).await??;
        DnsResponse::decode(query, reply)
    }

    fn requires_padding(&self) -> bool {
        matches!(self.connector, Connector::Tls(_))
    }

    fn network(&self) -> &str {
        match self.connector {
            Connector::Tcp(_) => "tcp",
            Connector::Tls(_) => "dot",
        }
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn close_idle_connections(&self) {
        match &self.connector {
            Connector::Tcp(dialer) => dialer.close_idle_connections(),
            Connector::Tls(dialer) => dialer.close_idle_connections(),
        }
    }
}
