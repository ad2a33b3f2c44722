//! Core resolver types and traits.
//!
//! This module defines the [`Resolver`] trait that every resolution strategy
//! and decorator implements, plus the [`HttpsSvc`] record summary.

use crate::base::neterror::NetError;
use async_trait::async_trait;
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    sync::Arc,
};

/// Summary of an HTTPS (SVCB) record: the advertised ALPN protocols and
/// address hints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpsSvc {
    pub alpn: Vec<String>,
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
}

impl HttpsSvc {
    /// Builds a record holding just `ip`, without ALPN.
    pub fn from_ip(ip: IpAddr) -> Self {
        let mut svc = Self::default();
        match ip {
            IpAddr::V4(v4) => svc.ipv4.push(v4),
            IpAddr::V6(v6) => svc.ipv6.push(v6),
        }
        svc
    }

    /// Returns true when the record carries no ALPN and no hints.
    pub fn is_empty(&self) -> bool {
        self.alpn.is_empty() && self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

/// Trait for hostname resolution.
///
/// Implemented by the DNS strategies ([`SerialResolver`](super::SerialResolver),
/// [`ParallelResolver`](super::ParallelResolver),
/// [`SystemResolver`](super::SystemResolver)) and by every decorator that
/// wraps them. Implementations must be thread-safe and use `&self` so a
/// single resolver can serve concurrent lookups.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves `domain` into its A and AAAA addresses.
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError>;

    /// Resolves the HTTPS record of `domain`.
    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError>;

    /// Resolves the NS records of `domain`.
    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError>;

    /// Network of the underlying transport, e.g. `udp` or `system`.
    fn network(&self) -> &str;

    /// Address of the underlying transport. Empty when not applicable.
    fn address(&self) -> &str;

    /// Releases idle connections held by the underlying transport.
    fn close_idle_connections(&self) {}
}

#[async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        (**self).lookup_host(domain).await
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        (**self).lookup_https(domain).await
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        (**self).lookup_ns(domain).await
    }

    fn network(&self) -> &str {
        (**self).network()
    }

    fn address(&self) -> &str {
        (**self).address()
    }

    fn close_idle_connections(&self) {
        (**self).close_idle_connections()
    }
}

/// Shared resolver handle.
pub type SharedResolver = Arc<dyn Resolver>;

impl fmt::Debug for dyn Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("network", &self.network())
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(Vec<IpAddr>);

    #[async_trait]
    impl Resolver for FixedResolver {
        async fn lookup_host(&self, _domain: &str) -> Result<Vec<IpAddr>, NetError> {
            Ok(self.0.clone())
        }

        async fn lookup_https(&self, _domain: &str) -> Result<HttpsSvc, NetError> {
            Err(NetError::NoDnsTransport)
        }

        async fn lookup_ns(&self, _domain: &str) -> Result<Vec<String>, NetError> {
            Err(NetError::NoDnsTransport)
        }

        fn network(&self) -> &str {
            "fixed"
        }

        fn address(&self) -> &str {
            ""
        }
    }

    #[test]
    fn test_https_svc_from_ip() {
        let v4 = HttpsSvc::from_ip("8.8.8.8".parse().unwrap());
        assert_eq!(v4.ipv4, vec![Ipv4Addr::new(8, 8, 8, 8)]);
        assert!(v4.ipv6.is_empty() && v4.alpn.is_empty());

        let v6 = HttpsSvc::from_ip("::1".parse().unwrap());
        assert_eq!(v6.ipv6, vec![Ipv6Addr::LOCALHOST]);
        assert!(!v6.is_empty());
        assert!(HttpsSvc::default().is_empty());
    }

    #[tokio::test]
    async fn test_arc_forwards() {
        let resolver: SharedResolver =
            Arc::new(FixedResolver(vec!["1.1.1.1".parse().unwrap()]));
        let nested = Arc::new(resolver.clone());
        assert_eq!(nested.lookup_host("x").await.unwrap().len(), 1);
        assert_eq!(nested.network(), "fixed");
        assert!(matches!(
            nested.lookup_ns("x").await,
            Err(NetError::NoDnsTransport)
        ));
        assert!(format!("{:?}", resolver).contains("fixed"));
    }
}
