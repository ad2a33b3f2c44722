//! Resolver cache.
//!
//! Sits in front of another resolver and answers address lookups from a
//! hostname-to-addresses map, either learned from earlier lookups or seeded
//! up front.

use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Whether the cache learns from lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Stores every successful lookup.
    #[default]
    ReadWrite,
    /// Only serves the seeded entries.
    ReadOnly,
}

/// Caches address lookups.
///
/// Lookups are not coalesced: two concurrent misses for the same name both
/// reach the underlying resolver, and the last one to finish is stored.
pub struct CacheResolver {
    resolver: SharedResolver,
    entries: DashMap<String, Vec<IpAddr>>,
    mode: CacheMode,
}

impl CacheResolver {
    /// A read-write cache, initially empty.
    pub fn new(resolver: SharedResolver) -> Self {
        Self {
            resolver,
            entries: DashMap::new(),
            mode: CacheMode::ReadWrite,
        }
    }

    /// A read-only cache serving `entries`.
    pub fn read_only(resolver: SharedResolver, entries: HashMap<String, Vec<IpAddr>>) -> Self {
        Self {
            resolver,
            entries: entries.into_iter().collect(),
            mode: CacheMode::ReadOnly,
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn get(&self, domain: &str) -> Option<Vec<IpAddr>> {
        self.entries.get(domain).map(|entry| entry.value().clone())
    }

    /// Stores `addrs` for `domain`, regardless of the mode.
    pub fn set(&self, domain: impl Into<String>, addrs: Vec<IpAddr>) {
        self.entries.insert(domain.into(), addrs);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CacheResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheResolver")
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for CacheResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        if let Some(addrs) = self.get(domain) {
            tracing::trace!(domain = %domain, "resolver cache hit");
            return Ok(addrs);
        }
        let addrs = self.resolver.lookup_host(domain).await?;
        if self.mode == CacheMode::ReadWrite {
            self.set(domain, addrs.clone());
        }
        Ok(addrs)
    }

    async fn lookup_https(&self, _domain: &str) -> Result<HttpsSvc, NetError> {
        Err(NetError::NoDnsTransport)
    }

    async fn lookup_ns(&self, _domain: &str) -> Result<Vec<String>, NetError> {
        Err(NetError::NoDnsTransport)
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
    use std::sync::Arc;

    #[tokio::test]
    async fn test_read_write_learns() {
        let mock = Arc::new(MockResolver::with_addrs(&["93.184.216.34"]));
        let cache = CacheResolver::new(mock.clone());
        assert_eq!(cache.mode(), CacheMode::ReadWrite);

        let first = cache.lookup_host("example.com").await.unwrap();
        let second = cache.lookup_host("example.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.calls(), 1);
        assert_eq!(cache.get("example.com"), Some(first));
    }

    #[tokio::test]
    async fn test_read_write_skips_failures() {
        let mock = Arc::new(MockResolver::new(Err(NetError::NoSuchHost)));
        let cache = CacheResolver::new(mock.clone());
        assert!(cache.lookup_host("nxdomain.example").await.is_err());
        assert!(cache.lookup_host("nxdomain.example").await.is_err());
        assert_eq!(mock.calls(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_serves_seeded_entries() {
        let mock = Arc::new(MockResolver::with_addrs(&["93.184.216.34"]));
        let seeded: Vec<IpAddr> = vec!["8.8.8.8".parse().unwrap(), "8.8.4.4".parse().unwrap()];
        let cache = CacheResolver::read_only(
            mock.clone(),
            HashMap::from([("dns.google".to_string(), seeded.clone())]),
        );

        assert_eq!(cache.lookup_host("dns.google").await.unwrap(), seeded);
        assert_eq!(mock.calls(), 0);

        cache.lookup_host("example.com").await.unwrap();
        cache.lookup_host("example.com").await.unwrap();
        assert_eq!(mock.calls(), 2);
        assert_eq!(cache.get("example.com"), None);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_https_and_ns_unsupported() {
        let cache = CacheResolver::new(Arc::new(MockResolver::with_addrs(&["1.1.1.1"])));
        assert!(matches!(
            cache.lookup_https("one.one.one.one").await,
            Err(NetError::NoDnsTransport)
        ));
        assert!(matches!(
            cache.lookup_ns("one.one.one.one").await,
            Err(NetError::NoDnsTransport)
        ));
    }

    #[test]
    fn test_set_and_get() {
        let cache = CacheResolver::new(Arc::new(MockResolver::with_addrs(&[])));
        cache.set("a.example", vec!["192.0.2.1".parse().unwrap()]);
        assert_eq!(cache.get("a.example").unwrap().len(), 1);
        assert!(format!("{cache:?}").contains("entries: 1"));
    }
}
