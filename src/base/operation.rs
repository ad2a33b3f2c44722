//! Operations a failure can be attributed to.

use serde::{Serialize, Serializer};
use std::fmt;

/// The operation that was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Resolve,
    Connect,
    TlsHandshake,
    QuicHandshake,
    HttpRoundTrip,
    DnsRoundTrip,
    Read,
    Write,
    ReadFrom,
    WriteTo,
    Close,
    QuicListen,
    /// Internal marker for the first half of a QUIC handshake.
    QuicHandshakeStart,
    /// Internal marker for the completion of a QUIC handshake.
    QuicHandshakeDone,
    Unknown,
    TopLevel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Resolve => "resolve",
            Operation::Connect => "connect",
            Operation::TlsHandshake => "tls_handshake",
            Operation::QuicHandshake => "quic_handshake",
            Operation::HttpRoundTrip => "http_round_trip",
            Operation::DnsRoundTrip => "dns_round_trip",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::ReadFrom => "read_from",
            Operation::WriteTo => "write_to",
            Operation::Close => "close",
            Operation::QuicListen => "quic_listen",
            Operation::QuicHandshakeStart => "quic_handshake_start",
            Operation::QuicHandshakeDone => "quic_handshake_done",
            Operation::Unknown => "unknown",
            Operation::TopLevel => "top_level",
        }
    }

    /// Major operations keep their attribution when an error bubbles up
    /// through read, write or close wrappers.
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            Operation::Resolve
                | Operation::Connect
                | Operation::TlsHandshake
                | Operation::QuicHandshake
                | Operation::HttpRoundTrip
        )
    }

    /// Returns true for the internal QUIC handshake markers.
    pub fn is_quic_handshake_marker(&self) -> bool {
        matches!(
            self,
            Operation::QuicHandshakeStart | Operation::QuicHandshakeDone
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
