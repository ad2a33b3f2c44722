//! Serial resolution: A then AAAA, one query at a time.

use crate::base::neterror::NetError;
use crate::dns::codec::DnsQuery;
use crate::dns::resolve::{HttpsSvc, Resolver};
use crate::dns::transport::SharedTransport;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Attempts per sub-lookup.
pub const SERIAL_MAX_ATTEMPTS: usize = 3;

/// Decides whether an error is a timeout, and therefore worth a retry.
pub type TimeoutPredicate = Arc<dyn Fn(&NetError) -> bool + Send + Sync>;

/// One step of a sub-lookup.
enum Step {
    Attempt(usize),
    Retry(usize),
    Done(Result<Vec<IpAddr>, NetError>),
}

/// Queries A and then AAAA over a [`DnsTransport`](crate::dns::DnsTransport).
///
/// Each sub-lookup is retried while it times out, up to
/// [`SERIAL_MAX_ATTEMPTS`] times. Suited to UDP and other transports that
/// may drop queries.
pub struct SerialResolver {
    txp: SharedTransport,
    num_timeouts: AtomicU64,
    is_timeout: TimeoutPredicate,
}

impl SerialResolver {
    pub fn new(txp: SharedTransport) -> Self {
        Self {
            txp,
            num_timeouts: AtomicU64::new(0),
            is_timeout: Arc::new(NetError::is_timeout),
        }
    }

    /// Replaces the predicate deciding which errors are retried.
    pub fn with_timeout_predicate(mut self, is_timeout: TimeoutPredicate) -> Self {
        self.is_timeout = is_timeout;
        self
    }

    /// Timeouts observed since creation.
    pub fn num_timeouts(&self) -> u64 {
        self.num_timeouts.load(Ordering::Relaxed)
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.txp
    }

    async fn lookup_once(&self, domain: &str, qtype: RecordType) -> Result<Vec<IpAddr>, NetError> {
        let query = DnsQuery::new(domain, qtype);
        self.txp.round_trip(&query).await?.lookup_host()
    }

    /// Returns the first error once retries are exhausted.
    async fn lookup_with_retry(
        &self,
        domain: &str,
        qtype: RecordType,
    ) -> Result<Vec<IpAddr>, NetError> {
        let mut first_err: Option<NetError> = None;
        let mut step = Step::Attempt(0);
        loop {
            step = match step {
                Step::Attempt(n) => match self.lookup_once(domain, qtype).await {
                    Ok(addrs) => Step::Done(Ok(addrs)),
                    Err(err) => {
                        let timed_out = (self.is_timeout)(&err);
                        let err = first_err.get_or_insert(err).clone();
                        if timed_out {
                            self.num_timeouts.fetch_add(1, Ordering::Relaxed);
                            Step::Retry(n + 1)
                        } else {
                            Step::Done(Err(err))
                        }
                    }
                },
                Step::Retry(n) if n < SERIAL_MAX_ATTEMPTS => Step::Attempt(n),
                Step::Retry(_) => Step::Done(Err(first_err.take().unwrap_or(NetError::Timeout))),
                Step::Done(result) => return result,
            };
        }
    }
}

#[async_trait]
impl Resolver for SerialResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let a = self.lookup_with_retry(domain, RecordType::A).await;
        let aaaa = self.lookup_with_retry(domain, RecordType::AAAA).await;
        match (a, aaaa) {
            (Err(err), Err(_)) => Err(err),
            (a, aaaa) => {
                let mut addrs = a.unwrap_or_default();
                addrs.extend(aaaa.unwrap_or_default());
                Ok(addrs)
            }
        }
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
