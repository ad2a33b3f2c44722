//! Platform resolution through `getaddrinfo`.
//!
//! Lookups run on the blocking thread pool. A fixed number of slots bounds
//! how many of them may be in flight at once; callers beyond that wait for
//! a slot. A caller that gives up leaves its background lookup running, and
//! the result is dropped when it completes.

use super::DnsTransport;
use crate::base::neterror::NetError;
use crate::dns::codec::{DnsQuery, DnsResponse};
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Maximum number of concurrent platform lookups.
pub const GETADDRINFO_MAX_CONCURRENCY: usize = 8;

/// Upper bound on a single platform lookup, slot wait included.
pub const GETADDRINFO_TIMEOUT: Duration = Duration::from_secs(15);

/// The platform resolution primitive.
#[async_trait]
pub trait LookupAny: Send + Sync {
    /// Returns the addresses of `domain` and its canonical name, which is
    /// empty when the platform does not report one.
    async fn lookup_any(&self, domain: &str) -> Result<(Vec<IpAddr>, String), NetError>;
}

#[async_trait]
impl<L: LookupAny + ?Sized> LookupAny for Arc<L> {
    async fn lookup_any(&self, domain: &str) -> Result<(Vec<IpAddr>, String), NetError> {
        (**self).lookup_any(domain).await
    }
}

/// [`LookupAny`] over `std::net::ToSocketAddrs`.
#[derive(Debug, Clone)]
pub struct StdLookupAny {
    slots: Arc<Semaphore>,
    timeout: Duration,
}

impl Default for StdLookupAny {
    fn default() -> Self {
        Self::new()
    }
}

impl StdLookupAny {
    pub fn new() -> Self {
        Self::with_slots(GETADDRINFO_MAX_CONCURRENCY)
    }

    /// Uses `slots` concurrent lookups instead of the default.
    pub fn with_slots(slots: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(slots)),
            timeout: GETADDRINFO_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Slots currently free.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| NetError::Canceled)?;
        let host = domain.to_string();

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            tracing::debug!(host = %host, "resolving via getaddrinfo");
            (host.as_str(), 0u16)
                .to_socket_addrs()
                .map(|iter| iter.map(|sa| sa.ip()).collect::<Vec<_>>())
        })
        .await;

        let addrs = joined
            .map_err(|e| {
                tracing::error!(error = %e, "getaddrinfo task failed");
                NetError::ServerMisbehaving
            })?
            .map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "getaddrinfo failed");
                lookup_error(e)
            })?;
        Ok(dedup(addrs))
    }
}

#[async_trait]
impl LookupAny for StdLookupAny {
    async fn lookup_any(&self, domain: &str) -> Result<(Vec<IpAddr>, String), NetError> {
        let addrs = tokio::time::timeout(self.timeout, self.lookup(domain)).await??;
        if addrs.is_empty() {
            return Err(NetError::NoAnswer);
        }
        tracing::debug!(domain = %domain, count = addrs.len(), "getaddrinfo complete");
        Ok((addrs, String::new()))
    }
}

/// Keeps OS error codes; otherwise maps the resolver message to a DNS error.
fn lookup_error(err: io::Error) -> NetError {
    if err.raw_os_error().is_some() {
        return NetError::from(err);
    }
    let message = err.to_string().to_ascii_lowercase();
    if message.contains("not known") || message.contains("no address") {
        NetError::NoSuchHost
    } else {
        NetError::ServerMisbehaving
    }
}

fn dedup(addrs: Vec<IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::with_capacity(addrs.len());
    for addr in addrs {
        if !out.contains(&addr) {
            out.push(addr);
        }
    }
    out
}

/// Answers ANY queries through a [`LookupAny`].
pub struct GetaddrinfoTransport {
    lookup: Arc<dyn LookupAny>,
}

impl GetaddrinfoTransport {
    pub fn new(lookup: Arc<dyn LookupAny>) -> Self {
        Self { lookup }
    }
}

impl Default for GetaddrinfoTransport {
    fn default() -> Self {
        Self::new(Arc::new(StdLookupAny::new()))
    }
}

#[async_trait]
impl DnsTransport for GetaddrinfoTransport {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        if query.qtype() != RecordType::ANY {
            return Err(NetError::NoDnsTransport);
        }
        let (addrs, cname) = self.lookup.lookup_any(query.domain()).await?;
        Ok(DnsResponse::from_platform(query, addrs, cname))
    }

    fn requires_padding(&self) -> bool {
        false
    }

    fn network(&self) -> &str {
        "getaddrinfo"
    }

    fn address(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    struct FixedLookup(Result<(Vec<IpAddr>, String), NetError>);

    #[async_trait]
    impl LookupAny for FixedLookup {
        async fn lookup_any(&self, _domain: &str) -> Result<(Vec<IpAddr>, String), NetError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_lookup_error_mapping() {
        let nx = io::Error::other("failed to lookup address information: Name or service not known");
        assert!(matches!(lookup_error(nx), NetError::NoSuchHost));

        let nodata = io::Error::other("No address associated with hostname");
        assert!(matches!(lookup_error(nodata), NetError::NoSuchHost));

        let other = io::Error::other("Temporary failure in name resolution");
        assert!(matches!(lookup_error(other), NetError::ServerMisbehaving));

        let os = io::Error::from_raw_os_error(1);
        assert_eq!(lookup_error(os).raw_os_error(), Some(1));
    }

    #[test]
    fn test_dedup_keeps_order() {
        let a = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let b = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(dedup(vec![a, b, a, b]), vec![a, b]);
    }

    #[tokio::test]
    async fn test_std_lookup_localhost() {
        let lookup = StdLookupAny::new();
        let (addrs, _) = lookup.lookup_any("localhost").await.unwrap();
        assert!(addrs.iter().all(IpAddr::is_loopback));
        assert_eq!(lookup.available_slots(), GETADDRINFO_MAX_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_transport_answers_any_only() {
        let addrs = vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))];
        let txp = GetaddrinfoTransport::new(Arc::new(FixedLookup(Ok((
            addrs.clone(),
            "dns.google".to_string(),
        )))));
        assert_eq!(txp.network(), "getaddrinfo");
        assert!(!txp.requires_padding());

        let response = txp
            .round_trip(&DnsQuery::new("dns.google", RecordType::ANY))
            .await
            .unwrap();
        assert_eq!(response.lookup_host().unwrap(), addrs);
        assert_eq!(response.canonical_name().as_deref(), Some("dns.google"));

        let err = txp
            .round_trip(&DnsQuery::new("dns.google", RecordType::A))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoDnsTransport));
    }

    #[tokio::test]
    async fn test_transport_propagates_lookup_error() {
        let txp = GetaddrinfoTransport::new(Arc::new(FixedLookup(Err(NetError::NoSuchHost))));
        let err = txp
            .round_trip(&DnsQuery::new("nxdomain.invalid", RecordType::ANY))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoSuchHost));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_free_slot() {
        let lookup = StdLookupAny::with_slots(1).timeout(Duration::from_millis(50));
        let _held = lookup.slots.clone().acquire_owned().await.unwrap();
        let err = lookup.lookup_any("localhost").await.unwrap_err();
        assert!(err.is_timeout());
    }
}
