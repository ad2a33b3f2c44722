//! Resolver logging.

use crate::base::logger::{DisplayList, SharedLogger};
use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Instant;

/// Logs the start, outcome and duration of every lookup.
pub struct LoggingResolver {
    resolver: SharedResolver,
    logger: SharedLogger,
}

impl LoggingResolver {
    pub fn new(resolver: SharedResolver, logger: SharedLogger) -> Self {
        Self { resolver, logger }
    }

    fn prefix(&self, kind: &str, domain: &str) -> String {
        format!(
            "resolve[{kind}] {domain} with {} ({})",
            self.resolver.network(),
            self.resolver.address()
        )
    }
}

#[async_trait]
impl Resolver for LoggingResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let prefix = self.prefix("A,AAAA", domain);
        self.logger.debug(&format!("{prefix}..."));
        let start = Instant::now();
        let result = self.resolver.lookup_host(domain).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(addrs) => self
                .logger
                .debug(&format!("{prefix}... {} in {elapsed:?}", DisplayList(addrs))),
            Err(err) => self.logger.debug(&format!("{prefix}... {err} in {elapsed:?}")),
        }
        result
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        let prefix = self.prefix("HTTPS", domain);
        self.logger.debug(&format!("{prefix}..."));
        let start = Instant::now();
        let result = self.resolver.lookup_https(domain).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(svc) => self.logger.debug(&format!(
                "{prefix}... {} {} {} in {elapsed:?}",
                DisplayList(&svc.alpn),
                DisplayList(&svc.ipv4),
                DisplayList(&svc.ipv6)
            )),
            Err(err) => self.logger.debug(&format!("{prefix}... {err} in {elapsed:?}")),
        }
        result
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        let prefix = self.prefix("NS", domain);
        self.logger.debug(&format!("{prefix}..."));
        let start = Instant::now();
        let result = self.resolver.lookup_ns(domain).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(ns) => self
                .logger
                .debug(&format!("{prefix}... {} in {elapsed:?}", DisplayList(ns))),
            Err(err) => self.logger.debug(&format!("{prefix}... {err} in {elapsed:?}")),
        }
        result
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
