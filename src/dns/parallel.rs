//! Parallel resolution: A and AAAA concurrently.

use crate::base::neterror::NetError;
use crate::dns::codec::DnsQuery;
use crate::dns::resolve::{HttpsSvc, Resolver};
use crate::dns::transport::SharedTransport;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;

/// Sends the A and AAAA queries at the same time and waits for both.
/// Suited to connection-oriented transports (TCP, TLS, HTTPS).
pub struct ParallelResolver {
    txp: SharedTransport,
}

impl ParallelResolver {
    pub fn new(txp: SharedTransport) -> Self {
        Self { txp }
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.txp
    }

    async fn lookup(&self, domain: &str, qtype: RecordType) -> Result<Vec<IpAddr>, NetError> {
        let query = DnsQuery::new(domain, qtype);
        self.txp.round_trip(&query).await?.lookup_host()
    }
}

#[async_trait]
impl Resolver for ParallelResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let (a, aaaa) = tokio::join!(
            self.lookup(domain, RecordType::A),
            self.lookup(domain, RecordType::AAAA)
        );
        if let (Err(err), Err(_)) = (&a, &aaaa) {
            return Err(err.clone());
        }
        let mut addrs = a.unwrap_or_default();
        addrs.extend(aaaa.unwrap_or_default());
        if addrs.is_empty() {
            return Err(NetError::NoAnswer);
        }
        Ok(addrs)
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        let query = DnsQuery::new(domain, RecordType::HTTPS);
        self.txp.round_trip(&query).await?.https()
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        let query = DnsQuery::new(domain, RecordType::NS);
        self.txp.round_trip(&query).await?.ns()
    }

    fn network(&self) -> &str {
        self.txp.network()
    }

    fn address(&self) -> &str {
        self.txp.address()
    }

    fn close_idle_connections(&self) {
        self.txp.close_idle_connections()
    }
}
