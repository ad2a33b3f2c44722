//! Internationalized domain names (RFC 3492 punycode).

use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use std::net::IpAddr;

/// Converts `domain` to its ASCII form.
pub fn to_ascii(domain: &str) -> Result<String, NetError> {
    idna::domain_to_ascii(domain).map_err(|_| NetError::InvalidLabel(domain.to_string()))
}

/// Converts every name to ASCII before passing it on.
pub struct IdnaResolver {
    resolver: SharedResolver,
}

impl IdnaResolver {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Resolver for IdnaResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        self.resolver.lookup_host(&to_ascii(domain)?).await
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        self.resolver.lookup_https(&to_ascii(domain)?).await
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        self.resolver.lookup_ns(&to_ascii(domain)?).await
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
