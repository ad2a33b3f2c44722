//! Hostname resolution.
//!
//! Resolution is split into three layers:
//!
//! - [`transport`]: one query/reply exchange over UDP, TCP, TLS, HTTPS or
//!   the platform resolver
//! - strategies turning exchanges into lookups: [`SerialResolver`],
//!   [`ParallelResolver`] and [`SystemResolver`]
//! - decorators adding behavior on top of any [`Resolver`]: IDNA,
//!   logging, IP-literal short-circuit, error wrapping, bogon detection,
//!   address-family filtering and caching
//!
//! [`compose`] assembles the standard pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use probenet::base::logger::default_logger;
//! use probenet::dns::compose::new_resolver;
//!
//! let resolver = new_resolver("dot://dns.google", default_logger())?;
//! let addrs = resolver.lookup_host("example.com").await?;
//! ```

pub mod bogon;
pub mod cache;
pub mod codec;
pub mod compose;
pub mod errwrap;
pub mod family;
pub mod idna;
pub mod logging;
pub mod null;
pub mod parallel;
mod resolve;
pub mod serial;
pub mod shortcircuit;
pub mod system;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use bogon::{is_bogon, BogonResolver};
pub use cache::{CacheMode, CacheResolver};
pub use codec::{DnsQuery, DnsResponse};
pub use compose::{new_resolver, wrap_resolver};
pub use errwrap::ErrWrapResolver;
pub use family::{AddressFamily, AddressFamilyResolver};
pub use hickory_proto::rr::RecordType;
pub use idna::IdnaResolver;
pub use logging::LoggingResolver;
pub use null::NullResolver;
pub use parallel::ParallelResolver;
pub use resolve::{HttpsSvc, Resolver, SharedResolver};
pub use serial::{SerialResolver, TimeoutPredicate};
pub use shortcircuit::ShortCircuitResolver;
pub use system::SystemResolver;
pub use transport::{DnsTransport, SharedTransport};
