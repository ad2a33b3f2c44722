//! DNS over UDP.
//!
//! Every exchange dials `udp` through the configured dialer, so the server
//! may be a hostname and socket errors get classified like any other
//! connection's. [`UdpTransport::async_round_trip`] keeps the socket open
//! after the first reply, so late and duplicate answers stay visible.

use super::DnsTransport;
use crate::base::neterror::NetError;
use crate::dns::codec::{DnsQuery, DnsResponse};
use crate::socket::{BoxedConn, Conn, SharedDialer};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Upper bound on [`DnsTransport::round_trip`], independent of the caller's
/// deadline.
pub const UDP_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long an async round trip keeps dialing and reading.
pub const UDP_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Receive buffer size.
pub const UDP_MAX_MESSAGE_SIZE: usize = 1 << 16;

/// One datagram received during an async round trip, or the error that
/// ended it.
#[derive(Debug)]
pub struct UdpResponse {
    pub local_addr: Option<SocketAddr>,
    pub remote_addr: Option<SocketAddr>,
    pub result: Result<DnsResponse, NetError>,
}

/// Replies of a pending async round trip.
///
/// The background task stops at the first error, when [`UDP_IO_TIMEOUT`]
/// expires, when the buffer is full or when this handle is dropped.
#[derive(Debug)]
pub struct UdpResponses {
    rx: mpsc::Receiver<UdpResponse>,
    task: JoinHandle<()>,
}

impl UdpResponses {
    /// Waits for the next reply.
    ///
    /// Fails with [`NetError::Timeout`] once the exchange has ended and
    /// every reply was consumed.
    pub async fn next(&mut self) -> Result<DnsResponse, NetError> {
        match self.rx.recv().await {
            Some(response) => response.result,
            None => Err(NetError::Timeout),
        }
    }

    /// Waits for the next entry with its socket addresses.
    pub async fn next_entry(&mut self) -> Option<UdpResponse> {
        self.rx.recv().await
    }

    /// Drains the successful replies already received, without waiting.
    pub fn try_next_responses(&mut self) -> Vec<DnsResponse> {
        let mut out = Vec::new();
        while let Ok(response) = self.rx.try_recv() {
            if let Ok(reply) = response.result {
                out.push(reply);
            }
        }
        out
    }

    /// Whether the background task has stopped reading.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for UdpResponses {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// DNS over UDP to `address` (`host:port`).
pub struct UdpTransport {
    dialer: SharedDialer,
    address: String,
}

impl UdpTransport {
    pub fn new(dialer: SharedDialer, address: impl Into<String>) -> Self {
        Self {
            dialer,
            address: address.into(),
        }
    }

    /// Sends `query` and reads replies in the background until
    /// [`UDP_IO_TIMEOUT`] expires. `buffer` bounds how many unread replies
    /// are kept; it is at least one.
    pub fn async_round_trip(&self, query: &DnsQuery, buffer: usize) -> UdpResponses {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let exchange = Exchange {
            dialer: self.dialer.clone(),
            address: self.address.clone(),
            query: query.clone(),
            tx,
        };
        UdpResponses {
            rx,
            task: tokio::spawn(exchange.run()),
        }
    }
}

struct Exchange {
    dialer: SharedDialer,
    address: String,
    query: DnsQuery,
    tx: mpsc::Sender<UdpResponse>,
}

impl Exchange {
    async fn run(self) {
        let deadline = Instant::now() + UDP_IO_TIMEOUT;
        let mut conn = match self.connect(deadline).await {
            Ok(conn) => conn,
            Err(err) => {
                self.emit(None, None, Err(err));
                return;
            }
        };
        let local_addr = conn.local_addr();
        let remote_addr = conn.peer_addr();
        let mut buf = vec![0u8; UDP_MAX_MESSAGE_SIZE];
        loop {
            let result = match tokio::time::timeout_at(deadline, conn.read(&mut buf)).await {
                Ok(Ok(n)) => DnsResponse::decode(&self.query, buf[..n].to_vec()),
                Ok(Err(err)) => Err(err.into()),
                Err(elapsed) => Err(elapsed.into()),
            };
            let failed = result.is_err();
            if !self.emit(local_addr, remote_addr, result) || failed {
                break;
            }
        }
        let _ = conn.shutdown().await;
    }

    async fn connect(&self, deadline: Instant) -> Result<BoxedConn, NetError> {
        let raw = self.query.encode(false)?;
        tracing::trace!(address = %self.address, id = self.query.id(), "udp query");
        let mut conn =
            tokio::time::timeout_at(deadline, self.dialer.dial("udp", &self.address)).await??;
        tokio::time::timeout_at(deadline, conn.write_all(&raw)).await??;
        Ok(conn)
    }

    /// Returns false when nobody can take the entry.
    fn emit(
        &self,
        local_addr: Option<SocketAddr>,
        remote_addr: Option<SocketAddr>,
        result: Result<DnsResponse, NetError>,
    ) -> bool {
        let response = UdpResponse {
            local_addr,
            remote_addr,
            result,
        };
        self.tx.try_send(response).is_ok()
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        let mut responses = self.async_round_trip(query, 1);
        tokio::time::timeout(UDP_EXCHANGE_TIMEOUT, responses.next()).await?
    }

    fn requires_padding(&self) -> bool {
        false
    }

    fn network(&self) -> &str {
        "udp"
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections();
    }
}
