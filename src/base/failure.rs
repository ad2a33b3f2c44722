//! Canonical failure strings.
//!
//! A [`Failure`] is the measurement-facing name of an error. The strings are
//! part of the data format consumed by the backend, so they never change
//! once published: `connection_refused` means the same thing regardless of
//! which platform, library or layer observed it.
//!
//! Errors that no classifier recognizes become `unknown_failure: <message>`,
//! with every IP-address-shaped substring of `<message>` scrubbed.

use crate::base::scrubber::scrub;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix of every failure string produced for an unclassified error.
pub const UNKNOWN_FAILURE_PREFIX: &str = "unknown_failure: ";

macro_rules! failures {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        /// A classified failure.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum Failure {
            $($(#[$meta])* $variant,)*
            /// An unclassified error. Holds the full `unknown_failure: ...`
            /// string, already scrubbed.
            Unknown(String),
        }

        impl Failure {
            /// The canonical string for this failure.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Failure::$variant => $name,)*
                    Failure::Unknown(s) => s,
                }
            }

            /// Looks up a canonical, non-unknown failure by its string.
            pub fn from_known(s: &str) -> Option<Self> {
                match s {
                    $($name => Some(Failure::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

failures! {
    // Syscall failures.
    AddressFamilyNotSupported => "address_family_not_supported",
    AddressInUse => "address_in_use",
    AddressNotAvailable => "address_not_available",
    AlreadyConnected => "already_connected",
    BadAddress => "bad_address",
    BadFileDescriptor => "bad_file_descriptor",
    ConnectionAborted => "connection_aborted",
    ConnectionAlreadyInProgress => "connection_already_in_progress",
    ConnectionRefused => "connection_refused",
    ConnectionReset => "connection_reset",
    DestinationAddressRequired => "destination_address_required",
    HostUnreachable => "host_unreachable",
    Interrupted => "interrupted",
    InvalidArgument => "invalid_argument",
    MessageSize => "message_size",
    NetworkDown => "network_down",
    NetworkReset => "network_reset",
    NetworkUnreachable => "network_unreachable",
    NoBufferSpace => "no_buffer_space",
    NoProtocolOption => "no_protocol_option",
    NotASocket => "not_a_socket",
    NotConnected => "not_connected",
    OperationWouldBlock => "operation_would_block",
    PermissionDenied => "permission_denied",
    ProtocolNotSupported => "protocol_not_supported",
    /// The kernel timed out the operation (`ETIMEDOUT`).
    TimedOut => "timed_out",
    WrongProtocolType => "wrong_protocol_type",
    DnsNoAnswer => "dns_no_answer",
    DnsNonRecoverableFailure => "dns_non_recoverable_failure",
    DnsTemporaryFailure => "dns_temporary_failure",
    DnsNxdomain => "dns_nxdomain_error",

    // Library failures.
    /// A resolver returned a private or otherwise non-routable address.
    DnsBogon => "dns_bogon_error",
    DnsRefused => "dns_refused_error",
    DnsServerMisbehaving => "dns_server_misbehaving",
    DnsServfail => "dns_servfail_error",
    DnsReplyWithWrongQueryId => "dns_reply_with_wrong_query_id",
    EofError => "eof_error",
    /// A user-space watchdog expired, as opposed to [`Failure::TimedOut`].
    GenericTimeout => "generic_timeout_error",
    QuicIncompatibleVersion => "quic_incompatible_version",
    SslFailedHandshake => "ssl_failed_handshake",
    SslInvalidHostname => "ssl_invalid_hostname",
    SslUnknownAuthority => "ssl_unknown_authority",
    SslInvalidCertificate => "ssl_invalid_certificate",
    JsonParseError => "json_parse_error",
    ConnectionAlreadyClosed => "connection_already_closed",
}

impl Failure {
    /// Builds the fallback failure for an error message nobody recognized.
    ///
    /// The message is scrubbed before being embedded.
    pub fn unknown(message: &str) -> Self {
        Failure::Unknown(format!("{}{}", UNKNOWN_FAILURE_PREFIX, scrub(message)))
    }

    /// Returns true for the `unknown_failure: ...` fallback.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Failure::Unknown(_))
    }

    /// Parses any failure string, known or `unknown_failure: ...`.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(f) = Self::from_known(s) {
            return Some(f);
        }
        s.strip_prefix(UNKNOWN_FAILURE_PREFIX)
            .map(|rest| Failure::Unknown(format!("{}{}", UNKNOWN_FAILURE_PREFIX, scrub(rest))))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Failure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Failure::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown failure string: {s:?}")))
    }
}
