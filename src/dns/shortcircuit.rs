//! IP literals never reach the network.

use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use crate::socket::address::parse_ip;
use async_trait::async_trait;
use std::net::IpAddr;

/// Answers IP literals directly, as `getaddrinfo` does.
pub struct ShortCircuitResolver {
    resolver: SharedResolver,
}

impl ShortCircuitResolver {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Resolver for ShortCircuitResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        match parse_ip(domain) {
            Some(ip) => Ok(vec![ip]),
            None => self.resolver.lookup_host(domain).await,
        }
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        match parse_ip(domain) {
            Some(ip) => Ok(HttpsSvc::from_ip(ip)),
            None => self.resolver.lookup_https(domain).await,
        }
    }

    /// Fails for IP literals, which have no name servers.
    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        if parse_ip(domain).is_some() {
            return Err(NetError::IpAddressNotDomain);
        }
        self.resolver.lookup_ns(domain).await
    }

    fn network(&self) -> &str {
        self.resolver.network()
    }

    fn address(&self) -> &str {
        self.resolver.address()
    }

    fn close_idle_connections(&self) {
        self.resolver.close_idle_connections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::testing::MockResolver;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::sync::Arc;

    fn resolver() -> (ShortCircuitResolver, Arc<MockResolver>) {
        let mock = Arc::new(MockResolver::with_addrs(&["93.184.216.34"]));
        (ShortCircuitResolver::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_literals_skip_the_network() {
        let (r, mock) = resolver();
        assert_eq!(
            r.lookup_host("8.8.8.8").await.unwrap(),
            vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))]
        );
        assert_eq!(
            r.lookup_host("::1").await.unwrap(),
            vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]
        );
        let svc = r.lookup_https("2001:db8::1").await.unwrap();
        assert_eq!(svc.ipv6, vec!["2001:db8::1".parse::<Ipv6Addr>().unwrap()]);
        assert!(svc.ipv4.is_empty() && svc.alpn.is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_ns_rejects_literal() {
        let (r, mock) = resolver();
        assert!(matches!(
            r.lookup_ns("1.1.1.1").await,
            Err(NetError::IpAddressNotDomain)
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_domains_pass_through() {
        let (r, mock) = resolver();
        assert_eq!(r.lookup_host("example.com").await.unwrap().len(), 1);
        assert_eq!(mock.domains(), vec!["example.com"]);
    }
}
