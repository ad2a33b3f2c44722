//! The platform resolver as a [`Resolver`].

use crate::base::neterror::NetError;
use crate::dns::codec::DnsQuery;
use crate::dns::resolve::{HttpsSvc, Resolver};
use crate::dns::transport::{DnsTransport, GetaddrinfoTransport};
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolves addresses through `getaddrinfo`. HTTPS and NS lookups need a
/// DNS transport and always fail.
pub struct SystemResolver {
    txp: Arc<dyn DnsTransport>,
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(Arc::new(GetaddrinfoTransport::default()))
    }
}

impl SystemResolver {
    /// Resolves through `txp`, which must answer ANY queries.
    pub fn new(txp: Arc<dyn DnsTransport>) -> Self {
        Self { txp }
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let query = DnsQuery::new(domain, RecordType::ANY);
        self.txp.round_trip(&query).await?.lookup_host()
    }

    async fn lookup_https(&self, _domain: &str) -> Result<HttpsSvc, NetError> {
        Err(NetError::NoDnsTransport)
    }

    async fn lookup_ns(&self, _domain: &str) -> Result<Vec<String>, NetError> {
        Err(NetError::NoDnsTransport)
    }

    fn network(&self) -> &str {
        "system"
    }

    fn address(&self) -> &str {
        ""
    }

    fn close_idle_connections(&self) {
        self.txp.close_idle_connections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::transport::LookupAny;

    struct FakeLookup;

    #[async_trait]
    impl LookupAny for FakeLookup {
        async fn lookup_any(&self, domain: &str) -> Result<(Vec<IpAddr>, String), NetError> {
            match domain {
                "dns.google" => Ok((
                    vec!["8.8.8.8".parse().unwrap(), "8.8.4.4".parse().unwrap()],
                    "dns.google".to_string(),
                )),
                _ => Err(NetError::NoSuchHost),
            }
        }
    }

    fn resolver() -> SystemResolver {
        SystemResolver::new(Arc::new(GetaddrinfoTransport::new(Arc::new(FakeLookup))))
    }

    #[tokio::test]
    async fn test_lookup_host() {
        let r = resolver();
        assert_eq!(r.lookup_host("dns.google").await.unwrap().len(), 2);
        assert!(matches!(
            r.lookup_host("nxdomain.example").await,
            Err(NetError::NoSuchHost)
        ));
        assert_eq!(r.network(), "system");
        assert_eq!(r.address(), "");
    }

    #[tokio::test]
    async fn test_https_and_ns_need_transport() {
        let r = resolver();
        assert!(matches!(
            r.lookup_https("dns.google").await,
            Err(NetError::NoDnsTransport)
        ));
        assert!(matches!(
            r.lookup_ns("dns.google").await,
            Err(NetError::NoDnsTransport)
        ));
    }
}
