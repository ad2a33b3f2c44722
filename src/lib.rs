//! # probenet
//!
//! Networking primitives for network measurement: hostname resolution and
//! TCP, TLS and QUIC connection establishment, where every failure is
//! reduced to a stable, machine-readable string.
//!
//! ## Features
//!
//! - **Failure Taxonomy**: errno-level, DNS, TLS and QUIC failures mapped to
//!   strings such as `connection_refused` or `dns_nxdomain_error`
//! - **Provenance**: each error remembers the operation it happened in
//! - **DNS**: UDP, TCP, DNS over TLS, DNS over HTTPS and getaddrinfo
//!   transports behind serial, parallel and system strategies
//! - **Decorators**: IDNA, logging, bogon detection, address-family
//!   filtering and caching around any resolver
//! - **Dialers**: TCP with per-address fan-out, BoringSSL TLS, quinn QUIC
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use probenet::config::NetConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = NetConfig::new().resolver_url("dot://dns.google");
//!     let dialer = config.build_tls_dialer().unwrap();
//!     match dialer.dial_tls("tcp", "example.com:443").await {
//!         Ok((_conn, state)) => println!("ok: {}", state.negotiated_protocol),
//!         Err(err) => println!("failure: {err}"),
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Failure taxonomy, classifiers and error types
//! - [`dns`] - Resolvers, transports and decorators
//! - [`socket`] - TCP and TLS dialers
//! - [`quic`] - QUIC dialers
//! - [`config`] - Builds the stack from one configuration

pub mod base;
pub mod config;
pub mod dns;
pub mod quic;
pub mod socket;

pub use base::errwrapper::WrappedError;
pub use base::failure::Failure;
pub use base::neterror::NetError;
pub use base::operation::Operation;
pub use config::NetConfig;
