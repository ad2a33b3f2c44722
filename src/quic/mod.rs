//! QUIC handshakes.
//!
//! Built on quinn with rustls. TLS settings are shared with the TCP stack
//! through [`TlsConfig`](crate::socket::tls::TlsConfig); transport
//! parameters live in [`QuicConfig`].
//!
//! # Example
//! ```ignore
//! use probenet::quic::{new_quic_dialer, QuicConfig};
//! use probenet::socket::tls::TlsConfig;
//!
//! let dialer = new_quic_dialer(resolver, logger);
//! let conn = dialer
//!     .dial_quic("udp", "www.google.com:443", &TlsConfig::new(), &QuicConfig::new())
//!     .await?;
//! println!("{}", conn.negotiated_protocol());
//! ```

mod config;
mod connection;
mod crypto;
mod dialer;
mod listener;

pub use config::{default_quic_alpn_for_port, QuicConfig};
pub use connection::QuicConnection;
pub use dialer::{
    new_quic_dialer, quic_config_for, wrap_quic_dialer, ErrWrapQuicDialer, LoggingQuicDialer,
    NullQuicDialer, QuicDialer, QuinnDialer, ResolvingQuicDialer, SharedQuicDialer,
};
pub use listener::{
    new_udp_listener, ErrWrapUdpListener, SharedUdpListener, StdUdpListener, UdpConn, UdpListener,
};
