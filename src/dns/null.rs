//! A resolver that cannot resolve.

use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver};
use async_trait::async_trait;
use std::net::IpAddr;

/// Fails every lookup with "no configured resolver". Useful for dialers
/// that must only ever see IP literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

#[async_trait]
impl Resolver for NullResolver {
    async fn lookup_host(&self, _domain: &str) -> Result<Vec<IpAddr>, NetError> {
        Err(NetError::NoResolver)
    }

    async fn lookup_https(&self, _domain: &str) -> Result<HttpsSvc, NetError> {
        Err(NetError::NoResolver)
    }

    async fn lookup_ns(&self, _domain: &str) -> Result<Vec<String>, NetError> {
        Err(NetError::NoResolver)
    }

    fn network(&self) -> &str {
        "null"
    }

    fn address(&self) -> &str {
        ""
    }
}
