//! Mock transports and resolvers shared by the resolver tests.

use super::codec::testing::reply;
use super::codec::{DnsQuery, DnsResponse};
use super::resolve::{HttpsSvc, Resolver};
use super::transport::DnsTransport;
use crate::base::neterror::NetError;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, RecordType};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&DnsQuery) -> Result<DnsResponse, NetError> + Send + Sync>;

/// Transport answering through a closure and recording every query.
pub struct MockTransport {
    handler: Handler,
    padding: bool,
    queries: Mutex<Vec<(RecordType, bool)>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&DnsQuery) -> Result<DnsResponse, NetError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            padding: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_padding(mut self) -> Self {
        self.padding = true;
        self
    }

    /// Query types seen so far, with whether the query was padded.
    pub fn queries(&self) -> Vec<(RecordType, bool)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsTransport for MockTransport {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        let raw = query.encode(self.padding)?;
        let padded = raw.len() % super::codec::PADDING_BLOCK_SIZE == 0;
        self.queries.lock().unwrap().push((query.qtype(), padded));
        (self.handler)(query)
    }

    fn requires_padding(&self) -> bool {
        self.padding
    }

    fn network(&self) -> &str {
        "mock"
    }

    fn address(&self) -> &str {
        "mock.example:53"
    }
}

/// Decoded reply to `query` listing the `addrs` matching its type.
pub fn answer(query: &DnsQuery, addrs: &[IpAddr]) -> DnsResponse {
    let rdata = addrs
        .iter()
        .map(|addr| match addr {
            IpAddr::V4(v4) => RData::A(A(*v4)),
            IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
        })
        .collect();
    DnsResponse::decode(query, reply(query, ResponseCode::NoError, rdata)).unwrap()
}

/// Decoded reply to `query` with `records` in the answer section.
pub fn answer_records(query: &DnsQuery, records: Vec<RData>) -> DnsResponse {
    DnsResponse::decode(query, reply(query, ResponseCode::NoError, records)).unwrap()
}

/// Resolver returning fixed results and counting its calls.
pub struct MockResolver {
    pub addrs: Result<Vec<IpAddr>, NetError>,
    pub https: Result<HttpsSvc, NetError>,
    pub ns: Result<Vec<String>, NetError>,
    calls: AtomicUsize,
    domains: Mutex<Vec<String>>,
}

impl MockResolver {
    pub fn new(addrs: Result<Vec<IpAddr>, NetError>) -> Self {
        Self {
            addrs,
            https: Err(NetError::NoAnswer),
            ns: Err(NetError::NoAnswer),
            calls: AtomicUsize::new(0),
            domains: Mutex::new(Vec::new()),
        }
    }

    pub fn with_addrs(addrs: &[&str]) -> Self {
        Self::new(Ok(addrs.iter().map(|a| a.parse().unwrap()).collect()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Domains passed to the resolver, in call order.
    pub fn domains(&self) -> Vec<String> {
        self.domains.lock().unwrap().clone()
    }

    fn record(&self, domain: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.domains.lock().unwrap().push(domain.to_string());
    }
}

#[async_trait]
impl Resolver for MockResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        self.record(domain);
        self.addrs.clone()
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        self.record(domain);
        self.https.clone()
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        self.record(domain);
        self.ns.clone()
    }

    fn network(&self) -> &str {
        "mock"
    }

    fn address(&self) -> &str {
        "mock.example:53"
    }
}
