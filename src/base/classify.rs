//! Error classifiers.
//!
//! A classifier turns a raw [`NetError`] into a [`Failure`]. There are four
//! of them, layered: the resolver, TLS and QUIC classifiers handle the
//! errors specific to their domain and delegate everything else to
//! [`classify_generic_error`].
//!
//! Every classifier first checks whether the error is already wrapped and,
//! if so, returns the existing failure unchanged. Classification happens
//! once, where the error is first observed.

use crate::base::errno::classify_syscall_error;
use crate::base::failure::Failure;
use crate::base::neterror::{NetError, TlsError};
use std::io;

/// Signature shared by all classifiers.
pub type Classifier = fn(&NetError) -> Failure;

/// Message suffixes produced by runtimes and libraries that do not expose a
/// typed error.
fn classify_by_suffix(message: &str) -> Option<Failure> {
    let suffixes = [
        ("operation was canceled", Failure::Interrupted),
        ("EOF", Failure::EofError),
        ("context deadline exceeded", Failure::GenericTimeout),
        ("transaction is timed out", Failure::GenericTimeout),
        ("i/o timeout", Failure::GenericTimeout),
        ("TLS handshake timeout", Failure::GenericTimeout),
        ("deadline has elapsed", Failure::GenericTimeout),
        ("no such host", Failure::DnsNxdomain),
        ("server misbehaving", Failure::DnsServerMisbehaving),
        ("no answer from DNS server", Failure::DnsNoAnswer),
        ("use of closed network connection", Failure::ConnectionAlreadyClosed),
    ];
    suffixes
        .into_iter()
        .find(|(suffix, _)| message.ends_with(suffix))
        .map(|(_, failure)| failure)
}

/// Classifies any error.
pub fn classify_generic_error(err: &NetError) -> Failure {
    if let Some(wrapped) = err.as_wrapped() {
        return wrapped.failure().clone();
    }
    if let Some(failure) = err.raw_os_error().and_then(classify_syscall_error) {
        return failure;
    }
    if let Some(failure) = classify_typed(err) {
        return failure;
    }
    let message = err.to_string();
    classify_by_suffix(&message).unwrap_or_else(|| Failure::unknown(&message))
}

fn classify_typed(err: &NetError) -> Option<Failure> {
    let failure = match err {
        NetError::Canceled => Failure::Interrupted,
        NetError::Timeout => Failure::GenericTimeout,
        NetError::Eof => Failure::EofError,
        NetError::NoSuchHost => Failure::DnsNxdomain,
        NetError::ServerMisbehaving => Failure::DnsServerMisbehaving,
        NetError::NoAnswer => Failure::DnsNoAnswer,
        NetError::WrongQueryId => Failure::DnsReplyWithWrongQueryId,
        NetError::ClosedConnection => Failure::ConnectionAlreadyClosed,
        NetError::Json(_) => Failure::JsonParseError,
        NetError::Io(e) => match e.kind() {
            io::ErrorKind::UnexpectedEof => Failure::EofError,
            io::ErrorKind::TimedOut => Failure::GenericTimeout,
            _ => return None,
        },
        _ => return None,
    };
    Some(failure)
}

/// Classifies errors returned by resolvers.
pub fn classify_resolver_error(err: &NetError) -> Failure {
    if let Some(wrapped) = err.as_wrapped() {
        return wrapped.failure().clone();
    }
    match err {
        NetError::Bogon => Failure::DnsBogon,
        NetError::Refused => Failure::DnsRefused,
        NetError::Servfail => Failure::DnsServfail,
        _ => classify_generic_error(err),
    }
}

/// Classifies errors returned by TLS handshakes.
pub fn classify_tls_handshake_error(err: &NetError) -> Failure {
    if let Some(wrapped) = err.as_wrapped() {
        return wrapped.failure().clone();
    }
    match err {
        NetError::Tls(TlsError::HostnameMismatch(_)) => Failure::SslInvalidHostname,
        NetError::Tls(TlsError::UnknownAuthority(_)) => Failure::SslUnknownAuthority,
        NetError::Tls(TlsError::InvalidCertificate(_)) => Failure::SslInvalidCertificate,
        _ => classify_generic_error(err),
    }
}

// TLS alerts (RFC 8446, section 6) as carried by QUIC CRYPTO_ERROR codes.
const ALERT_HANDSHAKE_FAILURE: u8 = 40;
const ALERT_BAD_CERTIFICATE: u8 = 42;
const ALERT_UNSUPPORTED_CERTIFICATE: u8 = 43;
const ALERT_CERTIFICATE_REVOKED: u8 = 44;
const ALERT_CERTIFICATE_EXPIRED: u8 = 45;
const ALERT_CERTIFICATE_UNKNOWN: u8 = 46;
const ALERT_UNKNOWN_CA: u8 = 48;
const ALERT_DECRYPT_ERROR: u8 = 51;
const ALERT_UNRECOGNIZED_NAME: u8 = 112;

const CRYPTO_ERROR_RANGE: std::ops::Range<u64> = 0x100..0x200;

/// Classifies errors returned by QUIC handshakes.
pub fn classify_quic_handshake_error(err: &NetError) -> Failure {
    if let Some(wrapped) = err.as_wrapped() {
        return wrapped.failure().clone();
    }
    if let NetError::Quic(e) = err {
        if let Some(failure) = classify_quic_connection_error(e) {
            return failure;
        }
    }
    classify_generic_error(err)
}

fn classify_quic_connection_error(err: &quinn::ConnectionError) -> Option<Failure> {
    use quinn::ConnectionError;
    match err {
        ConnectionError::VersionMismatch => Some(Failure::QuicIncompatibleVersion),
        ConnectionError::Reset => Some(Failure::ConnectionReset),
        ConnectionError::TimedOut => Some(Failure::GenericTimeout),
        ConnectionError::TransportError(e) => classify_transport_code(u64::from(e.code), &e.reason),
        ConnectionError::ConnectionClosed(close) => classify_transport_code(
            u64::from(close.error_code),
            &String::from_utf8_lossy(&close.reason),
        ),
        _ => None,
    }
}

fn classify_transport_code(code: u64, reason: &str) -> Option<Failure> {
    if code == u64::from(quinn::TransportErrorCode::CONNECTION_REFUSED) {
        return Some(Failure::ConnectionRefused);
    }
    if code == u64::from(quinn::TransportErrorCode::INTERNAL_ERROR) {
        // A peer-side classification embedded in the reason phrase.
        return Failure::from_known(reason);
    }
    if !CRYPTO_ERROR_RANGE.contains(&code) {
        return None;
    }
    match (code & 0xff) as u8 {
        ALERT_BAD_CERTIFICATE
        | ALERT_UNSUPPORTED_CERTIFICATE
        | ALERT_CERTIFICATE_REVOKED
        | ALERT_CERTIFICATE_EXPIRED
        | ALERT_CERTIFICATE_UNKNOWN => Some(Failure::SslInvalidCertificate),
        ALERT_DECRYPT_ERROR | ALERT_HANDSHAKE_FAILURE => Some(Failure::SslFailedHandshake),
        ALERT_UNKNOWN_CA => Some(Failure::SslUnknownAuthority),
        ALERT_UNRECOGNIZED_NAME => Some(Failure::SslInvalidHostname),
        _ => None,
    }
}
