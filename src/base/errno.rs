//! Per-platform syscall error classification.
//!
//! Maps raw OS error codes (as returned by [`std::io::Error::raw_os_error`])
//! to a [`Failure`]. Codes without an entry return `None` so that the caller
//! can keep classifying by other means.

use crate::base::failure::Failure;

/// Classifies a raw OS error code.
#[cfg(unix)]
pub fn classify_syscall_error(code: i32) -> Option<Failure> {
    let failure = match code {
        libc::ECONNREFUSED => Failure::ConnectionRefused,
        libc::ECONNRESET => Failure::ConnectionReset,
        libc::EHOSTUNREACH => Failure::HostUnreachable,
        libc::ETIMEDOUT => Failure::TimedOut,
        libc::EAFNOSUPPORT => Failure::AddressFamilyNotSupported,
        libc::EADDRINUSE => Failure::AddressInUse,
        libc::EADDRNOTAVAIL => Failure::AddressNotAvailable,
        libc::EISCONN => Failure::AlreadyConnected,
        libc::EFAULT => Failure::BadAddress,
        libc::EBADF => Failure::BadFileDescriptor,
        libc::ECONNABORTED => Failure::ConnectionAborted,
        libc::EALREADY => Failure::ConnectionAlreadyInProgress,
        libc::EDESTADDRREQ => Failure::DestinationAddressRequired,
        libc::EINTR => Failure::Interrupted,
        libc::EINVAL => Failure::InvalidArgument,
        libc::EMSGSIZE => Failure::MessageSize,
        libc::ENETDOWN => Failure::NetworkDown,
        libc::ENETRESET => Failure::NetworkReset,
        libc::ENETUNREACH => Failure::NetworkUnreachable,
        libc::ENOBUFS => Failure::NoBufferSpace,
        libc::ENOPROTOOPT => Failure::NoProtocolOption,
        libc::ENOTSOCK => Failure::NotASocket,
        libc::ENOTCONN => Failure::NotConnected,
        libc::EWOULDBLOCK => Failure::OperationWouldBlock,
        libc::EACCES => Failure::PermissionDenied,
        libc::EPROTONOSUPPORT => Failure::ProtocolNotSupported,
        libc::EPROTOTYPE => Failure::WrongProtocolType,
        _ => return None,
    };
    Some(failure)
}

/// Winsock error codes.
#[cfg(windows)]
mod wsa {
    pub const WSAEINTR: i32 = 10004;
    pub const WSAEBADF: i32 = 10009;
    pub const WSAEACCES: i32 = 10013;
    pub const WSAEFAULT: i32 = 10014;
    pub const WSAEINVAL: i32 = 10022;
    pub const WSAEWOULDBLOCK: i32 = 10035;
    pub const WSAEALREADY: i32 = 10037;
    pub const WSAENOTSOCK: i32 = 10038;
    pub const WSAEDESTADDRREQ: i32 = 10039;
    pub const WSAEMSGSIZE: i32 = 10040;
    pub const WSAEPROTOTYPE: i32 = 10041;
    pub const WSAENOPROTOOPT: i32 = 10042;
    pub const WSAEPROTONOSUPPORT: i32 = 10043;
    pub const WSAEAFNOSUPPORT: i32 = 10047;
    pub const WSAEADDRINUSE: i32 = 10048;
    pub const WSAEADDRNOTAVAIL: i32 = 10049;
    pub const WSAENETDOWN: i32 = 10050;
    pub const WSAENETUNREACH: i32 = 10051;
    pub const WSAENETRESET: i32 = 10052;
    pub const WSAECONNABORTED: i32 = 10053;
    pub const WSAECONNRESET: i32 = 10054;
    pub const WSAENOBUFS: i32 = 10055;
    pub const WSAEISCONN: i32 = 10056;
    pub const WSAENOTCONN: i32 = 10057;
    pub const WSAETIMEDOUT: i32 = 10060;
    pub const WSAECONNREFUSED: i32 = 10061;
    pub const WSAEHOSTUNREACH: i32 = 10065;
    pub const WSAHOST_NOT_FOUND: i32 = 11001;
    pub const WSATRY_AGAIN: i32 = 11002;
    pub const WSANO_RECOVERY: i32 = 11003;
    pub const WSANO_DATA: i32 = 11004;
}

/// Classifies a raw OS error code.
#[cfg(windows)]
pub fn classify_syscall_error(code: i32) -> Option<Failure> {
    use wsa::*;
    let failure = match code {
        WSAECONNREFUSED => Failure::ConnectionRefused,
        WSAECONNRESET => Failure::ConnectionReset,
        WSAEHOSTUNREACH => Failure::HostUnreachable,
        WSAETIMEDOUT => Failure::TimedOut,
        WSAEAFNOSUPPORT => Failure::AddressFamilyNotSupported,
        WSAEADDRINUSE => Failure::AddressInUse,
        WSAEADDRNOTAVAIL => Failure::AddressNotAvailable,
        WSAEISCONN => Failure::AlreadyConnected,
        WSAEFAULT => Failure::BadAddress,
        WSAEBADF => Failure::BadFileDescriptor,
        WSAECONNABORTED => Failure::ConnectionAborted,
        WSAEALREADY => Failure::ConnectionAlreadyInProgress,
        WSAEDESTADDRREQ => Failure::DestinationAddressRequired,
        WSAEINTR => Failure::Interrupted,
        WSAEINVAL => Failure::InvalidArgument,
        WSAEMSGSIZE => Failure::MessageSize,
        WSAENETDOWN => Failure::NetworkDown,
        WSAENETRESET => Failure::NetworkReset,
        WSAENETUNREACH => Failure::NetworkUnreachable,
        WSAENOBUFS => Failure::NoBufferSpace,
        WSAENOPROTOOPT => Failure::NoProtocolOption,
        WSAENOTSOCK => Failure::NotASocket,
        WSAENOTCONN => Failure::NotConnected,
        WSAEWOULDBLOCK => Failure::OperationWouldBlock,
        WSAEACCES => Failure::PermissionDenied,
        WSAEPROTONOSUPPORT => Failure::ProtocolNotSupported,
        WSAEPROTOTYPE => Failure::WrongProtocolType,
        WSANO_DATA => Failure::DnsNoAnswer,
        WSANO_RECOVERY => Failure::DnsNonRecoverableFailure,
        WSATRY_AGAIN => Failure::DnsTemporaryFailure,
        WSAHOST_NOT_FOUND => Failure::DnsNxdomain,
        _ => return None,
    };
    Some(failure)
}

#[cfg(not(any(unix, windows)))]
pub fn classify_syscall_error(_code: i32) -> Option<Failure> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapped_errno() {
        let table = [
            (libc::ECONNREFUSED, "connection_refused"),
            (libc::ECONNRESET, "connection_reset"),
            (libc::EHOSTUNREACH, "host_unreachable"),
            (libc::ETIMEDOUT, "timed_out"),
            (libc::EAFNOSUPPORT, "address_family_not_supported"),
            (libc::EADDRINUSE, "address_in_use"),
            (libc::EADDRNOTAVAIL, "address_not_available"),
            (libc::EISCONN, "already_connected"),
            (libc::EFAULT, "bad_address"),
            (libc::EBADF, "bad_file_descriptor"),
            (libc::ECONNABORTED, "connection_aborted"),
            (libc::EALREADY, "connection_already_in_progress"),
            (libc::EDESTADDRREQ, "destination_address_required"),
            (libc::EINTR, "interrupted"),
            (libc::EINVAL, "invalid_argument"),
            (libc::EMSGSIZE, "message_size"),
            (libc::ENETDOWN, "network_down"),
            (libc::ENETRESET, "network_reset"),
            (libc::ENETUNREACH, "network_unreachable"),
            (libc::ENOBUFS, "no_buffer_space"),
            (libc::ENOPROTOOPT, "no_protocol_option"),
            (libc::ENOTSOCK, "not_a_socket"),
            (libc::ENOTCONN, "not_connected"),
            (libc::EWOULDBLOCK, "operation_would_block"),
            (libc::EACCES, "permission_denied"),
            (libc::EPROTONOSUPPORT, "protocol_not_supported"),
            (libc::EPROTOTYPE, "wrong_protocol_type"),
        ];
        for (code, expected) in table {
            let failure = classify_syscall_error(code).expect("mapped errno");
            assert_eq!(failure.as_str(), expected, "errno {code}");
        }
    }

    #[test]
    fn test_unmapped_errno_is_none() {
        assert_eq!(classify_syscall_error(libc::ENOENT), None);
        assert_eq!(classify_syscall_error(0), None);
        assert_eq!(classify_syscall_error(-1), None);
    }
}
