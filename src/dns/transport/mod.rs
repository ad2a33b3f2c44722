//! DNS transports.
//!
//! A [`DnsTransport`] performs one query/reply exchange. The wire transports
//! speak RFC 1035 over UDP, TCP, TLS and HTTPS; [`GetaddrinfoTransport`]
//! answers through the platform resolver instead.

mod getaddrinfo;
mod https;
mod stream;
mod udp;

pub use getaddrinfo::{
    GetaddrinfoTransport, LookupAny, StdLookupAny, GETADDRINFO_MAX_CONCURRENCY,
    GETADDRINFO_TIMEOUT,
};
pub use https::{HttpsTransport, HTTP_READ_TIMEOUT};
pub use stream::{StreamTransport, STREAM_EXCHANGE_TIMEOUT};
pub use udp::{
    UdpResponse, UdpResponses, UdpTransport, UDP_EXCHANGE_TIMEOUT, UDP_IO_TIMEOUT,
    UDP_MAX_MESSAGE_SIZE,
};

use crate::base::neterror::NetError;
use crate::dns::codec::{DnsQuery, DnsResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// One query/reply exchange with a DNS server.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends `query` and returns the matching reply.
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError>;

    /// Whether queries sent over this transport should be padded.
    fn requires_padding(&self) -> bool;

    /// Transport name, e.g. `udp`, `tcp`, `dot` or `doh`.
    fn network(&self) -> &str;

    /// Server address or URL.
    fn address(&self) -> &str;

    fn close_idle_connections(&self) {}
}

#[async_trait]
impl<T: DnsTransport + ?Sized> DnsTransport for Arc<T> {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        (**self).round_trip(query).await
    }

    fn requires_padding(&self) -> bool {
        (**self).requires_padding()
    }

    fn network(&self) -> &str {
        (**self).network()
    }

    fn address(&self) -> &str {
        (**self).address()
    }

    fn close_idle_connections(&self) {
        (**self).close_idle_connections()
    }
}

/// Shared transport handle.
pub type SharedTransport = Arc<dyn DnsTransport>;
