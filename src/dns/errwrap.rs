//! Error-wrapping resolver.

use crate::base::classify::classify_resolver_error;
use crate::base::errwrapper::ResultExt;
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use std::net::IpAddr;

/// Wraps every lookup failure with [`Operation::Resolve`] and the resolver
/// classifier.
pub struct ErrWrapResolver {
    resolver: SharedResolver,
}

impl ErrWrapResolver {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Resolver for ErrWrapResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        self.resolver
            .lookup_host(domain)
            .await
            .wrap_err(classify_resolver_error, Operation::Resolve)
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        self.resolver
            .lookup_https(domain)
            .await
            .wrap_err(classify_resolver_error, Operation::Resolve)
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        self.resolver
            .lookup_ns(domain)
            .await
            .wrap_err(classify_resolver_error, Operation::Resolve)
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
