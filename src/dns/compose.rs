//! Resolver pipelines.
//!
//! [`wrap_resolver`] stacks the standard decorators on a base resolver.
//! [`new_resolver`] and friends build the base resolver from a URL:
//!
//! | URL                      | Transport     | Strategy |
//! |--------------------------|---------------|----------|
//! | `system:///`             | getaddrinfo   | system   |
//! | `udp://1.1.1.1:53`       | UDP           | serial   |
//! | `tcp://1.1.1.1:53`       | TCP           | parallel |
//! | `dot://dns.google:853`   | TLS           | parallel |
//! | `https://dns.google/...` | HTTP/1.1, TLS | parallel |

use crate::base::logger::SharedLogger;
use crate::base::neterror::NetError;
use crate::dns::errwrap::ErrWrapResolver;
use crate::dns::idna::IdnaResolver;
use crate::dns::logging::LoggingResolver;
use crate::dns::parallel::ParallelResolver;
use crate::dns::resolve::SharedResolver;
use crate::dns::serial::SerialResolver;
use crate::dns::shortcircuit::ShortCircuitResolver;
use crate::dns::system::SystemResolver;
use crate::dns::transport::{HttpsTransport, SharedTransport, StreamTransport, UdpTransport};
use crate::socket::address::{join_host_port, url_host_port};
use crate::socket::tls::{new_tls_dialer, new_tls_handshaker, SharedTlsHandshaker, TlsConfig};
use crate::socket::{new_dialer, SharedDialer};
use std::sync::Arc;
use url::Url;

/// Stacks `IDNA(Logging(ShortCircuit(ErrWrap(resolver))))`.
pub fn wrap_resolver(resolver: SharedResolver, logger: SharedLogger) -> SharedResolver {
    let wrapped: SharedResolver = Arc::new(ErrWrapResolver::new(resolver));
    let wrapped: SharedResolver = Arc::new(ShortCircuitResolver::new(wrapped));
    let wrapped: SharedResolver = Arc::new(LoggingResolver::new(wrapped, logger));
    Arc::new(IdnaResolver::new(wrapped))
}

/// Wrapped system resolver.
pub fn new_system_resolver(logger: SharedLogger) -> SharedResolver {
    wrap_resolver(Arc::new(SystemResolver::default()), logger)
}

/// What a wire transport needs to reach its server.
#[derive(Clone)]
pub struct TransportDeps {
    /// Dials TCP connections, for `tcp`, `dot` and `https`.
    pub dialer: SharedDialer,
    pub handshaker: SharedTlsHandshaker,
    pub tls_config: TlsConfig,
}

impl TransportDeps {
    /// Dialer and handshaker logging to `logger`, resolving server names
    /// with the system resolver.
    pub fn new(logger: SharedLogger) -> Result<Self, NetError> {
        Ok(Self {
            dialer: new_dialer(new_system_resolver(logger.clone()), logger.clone()),
            handshaker: new_tls_handshaker(logger)?,
            tls_config: TlsConfig::default(),
        })
    }

    fn tls_config_with_alpn(&self, alpn: &str) -> TlsConfig {
        let mut config = self.tls_config.clone();
        if config.alpn_protocols.is_empty() {
            config.alpn_protocols = vec![alpn.to_string()];
        }
        config
    }
}

fn parse_url(resolver_url: &str) -> Result<Url, NetError> {
    Url::parse(resolver_url).map_err(|e| NetError::InvalidAddress {
        address: resolver_url.to_string(),
        reason: e.to_string(),
    })
}

/// Builds the wire transport for `resolver_url`. `system` URLs have none.
pub fn new_transport(resolver_url: &str, deps: &TransportDeps) -> Result<SharedTransport, NetError> {
    let url = parse_url(resolver_url)?;
    let txp: SharedTransport = match url.scheme() {
        "udp" => {
            let (host, port) = url_host_port(&url, 53)?;
            Arc::new(UdpTransport::new(
                deps.dialer.clone(),
                join_host_port(&host, port),
            ))
        }
        "tcp" => {
            let (host, port) = url_host_port(&url, 53)?;
            Arc::new(StreamTransport::tcp(
                deps.dialer.clone(),
                join_host_port(&host, port),
            ))
        }
        "dot" => {
            let (host, port) = url_host_port(&url, 853)?;
            let tls = new_tls_dialer(
                deps.dialer.clone(),
                deps.handshaker.clone(),
                deps.tls_config_with_alpn("dot"),
            );
            Arc::new(StreamTransport::tls(tls, join_host_port(&host, port)))
        }
        "https" => {
            let tls = new_tls_dialer(
                deps.dialer.clone(),
                deps.handshaker.clone(),
                deps.tls_config_with_alpn("http/1.1"),
            );
            Arc::new(HttpsTransport::new(tls, resolver_url)?)
        }
        other => return Err(NetError::UnsupportedNetwork(other.to_string())),
    };
    Ok(txp)
}

/// Builds the base resolver for `resolver_url`, without decorators.
pub fn new_unwrapped_resolver(
    resolver_url: &str,
    deps: &TransportDeps,
) -> Result<SharedResolver, NetError> {
    let url = parse_url(resolver_url)?;
    let resolver: SharedResolver = match url.scheme() {
        "system" => Arc::new(SystemResolver::default()),
        "udp" => Arc::new(SerialResolver::new(new_transport(resolver_url, deps)?)),
        _ => Arc::new(ParallelResolver::new(new_transport(resolver_url, deps)?)),
    };
    Ok(resolver)
}

/// Builds the wrapped resolver for `resolver_url`.
pub fn new_resolver(resolver_url: &str, logger: SharedLogger) -> Result<SharedResolver, NetError> {
    let deps = TransportDeps::new(logger.clone())?;
    Ok(wrap_resolver(new_unwrapped_resolver(resolver_url, &deps)?, logger))
}
