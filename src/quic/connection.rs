//! An established QUIC connection.

use crate::base::neterror::NetError;
use quinn::crypto::rustls::HandshakeData;
use quinn::{Connection, Endpoint, RecvStream, SendStream, VarInt};
use std::fmt;
use std::net::SocketAddr;

/// A QUIC connection together with the endpoint that owns its UDP socket.
///
/// Every dial opens its own endpoint, so closing the connection also
/// releases the socket.
pub struct QuicConnection {
    endpoint: Endpoint,
    connection: Connection,
    server_name: String,
}

impl QuicConnection {
    pub(crate) fn new(endpoint: Endpoint, connection: Connection, server_name: String) -> Self {
        Self {
            endpoint,
            connection,
            server_name,
        }
    }

    /// The underlying quinn connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    pub fn local_address(&self) -> Result<SocketAddr, NetError> {
        Ok(self.endpoint.local_addr()?)
    }

    /// Negotiated ALPN protocol, empty if none.
    pub fn negotiated_protocol(&self) -> String {
        self.handshake_data()
            .and_then(|data| data.protocol)
            .map(|p| String::from_utf8_lossy(&p).into_owned())
            .unwrap_or_default()
    }

    /// Server name sent in the handshake.
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    fn handshake_data(&self) -> Option<HandshakeData> {
        self.connection
            .handshake_data()
            .and_then(|data| data.downcast::<HandshakeData>().ok())
            .map(|data| *data)
    }

    pub async fn open_bi(&self) -> Result<(SendStream, RecvStream), NetError> {
        Ok(self.connection.open_bi().await?)
    }

    /// Closes the connection and its endpoint.
    pub fn close(&self) {
        self.connection.close(VarInt::from_u32(0), b"");
        self.endpoint.close(VarInt::from_u32(0), b"");
    }

    /// Closes and waits until the peer has been notified or the idle
    /// timeout expired.
    pub async fn shutdown(self) {
        self.close();
        self.endpoint.wait_idle().await;
    }
}

impl fmt::Debug for QuicConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuicConnection")
            .field("remote", &self.connection.remote_address())
            .field("server_name", &self.server_name)
            .field("stable_id", &self.connection.stable_id())
            .finish()
    }
}
