//! UDP sockets backing QUIC endpoints.

use crate::base::classify::classify_generic_error;
use crate::base::errwrapper::ResultExt;
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// A bound UDP socket.
///
/// Sockets handed out by [`ErrWrapUdpListener`] classify their `recv_from`
/// and `send_to` failures.
#[derive(Debug)]
pub struct UdpConn {
    socket: UdpSocket,
    wrap_errors: bool,
}

impl UdpConn {
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            wrap_errors: false,
        }
    }

    fn wrapped(mut self) -> Self {
        self.wrap_errors = true;
        self
    }

    fn check<T>(&self, result: std::io::Result<T>, operation: Operation) -> Result<T, NetError> {
        if self.wrap_errors {
            result.wrap_err(classify_generic_error, operation)
        } else {
            Ok(result?)
        }
    }

    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), NetError> {
        let result = self.socket.recv_from(buf).await;
        self.check(result, Operation::ReadFrom)
    }

    pub async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, NetError> {
        let result = self.socket.send_to(buf, target).await;
        self.check(result, Operation::WriteTo)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    /// Releases the socket for use by a QUIC endpoint. The returned socket
    /// is in non-blocking mode.
    pub fn into_std(self) -> Result<std::net::UdpSocket, NetError> {
        Ok(self.socket.into_std()?)
    }
}

/// Opens UDP sockets.
#[async_trait]
pub trait UdpListener: Send + Sync {
    async fn listen(&self, addr: SocketAddr) -> Result<UdpConn, NetError>;
}

#[async_trait]
impl<L: UdpListener + ?Sized> UdpListener for Arc<L> {
    async fn listen(&self, addr: SocketAddr) -> Result<UdpConn, NetError> {
        (**self).listen(addr).await
    }
}

/// Shared listener handle.
pub type SharedUdpListener = Arc<dyn UdpListener>;

/// Binds tokio UDP sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdUdpListener;

#[async_trait]
impl UdpListener for StdUdpListener {
    async fn listen(&self, addr: SocketAddr) -> Result<UdpConn, NetError> {
        Ok(UdpConn::new(UdpSocket::bind(addr).await?))
    }
}

/// Wraps bind failures with [`Operation::QuicListen`] and I/O failures on
/// the returned socket with `read_from` / `write_to`.
pub struct ErrWrapUdpListener {
    listener: SharedUdpListener,
}

impl ErrWrapUdpListener {
    pub fn new(listener: SharedUdpListener) -> Self {
        Self { listener }
    }
}

#[async_trait]
impl UdpListener for ErrWrapUdpListener {
    async fn listen(&self, addr: SocketAddr) -> Result<UdpConn, NetError> {
        let conn = self
            .listener
            .listen(addr)
            .await
            .wrap_err(classify_generic_error, Operation::QuicListen)?;
        Ok(conn.wrapped())
    }
}

/// Error-wrapped listener over [`StdUdpListener`].
pub fn new_udp_listener() -> SharedUdpListener {
    Arc::new(ErrWrapUdpListener::new(Arc::new(StdUdpListener)))
}
