//! Crate-wide error type.
//!
//! Every fallible operation in the crate returns [`NetError`]. Errors that
//! went through a wrapper carry their classification in
//! [`NetError::Wrapped`]; everything else is a raw cause waiting to be
//! classified.

use crate::base::errwrapper::WrappedError;
use crate::base::failure::Failure;
use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    /// An error that has already been classified.
    #[error(transparent)]
    Wrapped(#[from] WrappedError),

    #[error(transparent)]
    Io(Arc<io::Error>),

    // DNS
    #[error("dns: no such host")]
    NoSuchHost,
    #[error("dns: server misbehaving")]
    ServerMisbehaving,
    #[error("dns: no answer from DNS server")]
    NoAnswer,
    #[error("dns: refused")]
    Refused,
    #[error("dns: servfail")]
    Servfail,
    #[error("dns: reply with wrong query ID")]
    WrongQueryId,
    #[error("dns: detected bogon address")]
    Bogon,
    #[error("dns: message is a query")]
    ReplyIsQuery,
    #[error("dns: cannot decode reply: {0}")]
    DecodeFailed(String),
    #[error("dns: cannot encode query: {0}")]
    EncodeFailed(String),
    #[error("operation requires a DNS transport")]
    NoDnsTransport,
    #[error("expected domain, found IP address")]
    IpAddressNotDomain,
    #[error("no configured resolver")]
    NoResolver,
    #[error("idna: invalid label {0:?}")]
    InvalidLabel(String),

    // Dialing
    #[error("no configured dialer")]
    NoDialer,
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),
    #[error("address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    // Handshakes
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("quic: {0}")]
    Quic(quinn::ConnectionError),
    #[error("quic: cannot start handshake: {0}")]
    QuicConnect(String),

    // HTTP (DNS over HTTPS)
    #[error("http: unexpected status code {0}")]
    HttpStatus(u16),
    #[error("http: unexpected content type {0:?}")]
    HttpContentType(String),
    #[error("http: {0}")]
    Http(String),

    // Generic
    #[error("i/o timeout")]
    Timeout,
    #[error("operation was canceled")]
    Canceled,
    #[error("EOF")]
    Eof,
    #[error("use of closed network connection")]
    ClosedConnection,
    #[error("json: {0}")]
    Json(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Other(String),
}

/// TLS handshake failures, split by what the certificate check found.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlsError {
    #[error("x509: certificate is not valid for the requested name ({0})")]
    HostnameMismatch(String),
    #[error("x509: certificate signed by unknown authority ({0})")]
    UnknownAuthority(String),
    #[error("x509: certificate is invalid ({0})")]
    InvalidCertificate(String),
    #[error("tls: handshake failed: {0}")]
    Handshake(String),
    #[error("tls: {0}")]
    Config(String),
}

impl NetError {
    /// Returns the classified error, if this error already went through a
    /// wrapper. Looks inside `io::Error` payloads too, since wrapped
    /// connections report failures through the `AsyncRead`/`AsyncWrite`
    /// traits.
    pub fn as_wrapped(&self) -> Option<&WrappedError> {
        match self {
            NetError::Wrapped(w) => Some(w),
            NetError::Io(e) => e.get_ref().and_then(|inner| inner.downcast_ref::<WrappedError>()),
            _ => None,
        }
    }

    /// The classified failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        self.as_wrapped().map(WrappedError::failure)
    }

    /// The raw OS error code of an underlying I/O error.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            NetError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    /// Returns true when the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            NetError::Timeout => true,
            NetError::Io(e) => e.kind() == io::ErrorKind::TimedOut,
            NetError::Wrapped(w) => matches!(
                w.failure(),
                Failure::GenericTimeout | Failure::TimedOut
            ),
            _ => false,
        }
    }

    /// Converts this error into an `io::Error`, keeping it reachable through
    /// `get_ref()` so that classification survives the round trip.
    pub fn into_io(self) -> io::Error {
        match self {
            NetError::Io(e) => match Arc::try_unwrap(e) {
                Ok(e) => e,
                Err(shared) => io::Error::new(shared.kind(), NetError::Io(shared)),
            },
            NetError::Wrapped(w) => {
                let kind = w.io_kind();
                io::Error::new(kind, w)
            }
            NetError::Timeout => io::Error::new(io::ErrorKind::TimedOut, NetError::Timeout),
            NetError::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, NetError::Eof),
            other => io::Error::other(other),
        }
    }
}

impl From<io::Error> for NetError {
    fn from(e: io::Error) -> Self {
        if let Some(inner) = e.get_ref() {
            if let Some(w) = inner.downcast_ref::<WrappedError>() {
                return NetError::Wrapped(w.clone());
            }
            if let Some(n) = inner.downcast_ref::<NetError>() {
                return n.clone();
            }
        }
        NetError::Io(Arc::new(e))
    }
}

impl From<tokio::time::error::Elapsed> for NetError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        NetError::Timeout
    }
}

impl From<quinn::ConnectionError> for NetError {
    fn from(e: quinn::ConnectionError) -> Self {
        NetError::Quic(e)
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Json(e.to_string())
    }
}
