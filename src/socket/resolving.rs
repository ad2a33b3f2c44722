//! Resolving dialer: hostname to addresses, then one attempt per address.

use crate::base::neterror::NetError;
use crate::dns::SharedResolver;
use crate::socket::address::{join_host_port, parse_ip, split_host_port};
use crate::socket::dialer::{Dialer, SharedDialer};
use crate::socket::stream::BoxedConn;
use async_trait::async_trait;
use std::net::IpAddr;

/// Resolves the host part of the address and tries every returned address
/// in order until one connects.
pub struct ResolvingDialer {
    dialer: SharedDialer,
    resolver: SharedResolver,
}

impl ResolvingDialer {
    pub fn new(dialer: SharedDialer, resolver: SharedResolver) -> Self {
        Self { dialer, resolver }
    }
}

/// Resolves `host` unless it already is an IP literal.
pub(crate) async fn lookup(resolver: &SharedResolver, host: &str) -> Result<Vec<IpAddr>, NetError> {
    match parse_ip(host) {
        Some(ip) => Ok(vec![ip]),
        None => resolver.lookup_host(host).await,
    }
}

/// Picks the error to report after every attempt failed.
///
/// The first classified error whose failure is not `unknown_failure` wins;
/// otherwise the first error is returned.
pub fn reduce_errors(errors: Vec<NetError>) -> NetError {
    let known = errors.iter().position(|err| {
        err.as_wrapped()
            .map(|w| !w.failure().is_unknown())
            .unwrap_or(false)
    });
    let index = known.unwrap_or(0);
    errors.into_iter().nth(index).unwrap_or(NetError::NoAnswer)
}

#[async_trait]
impl Dialer for ResolvingDialer {
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConn, NetError> {
        let (host, port) = split_host_port(address)?;
        let addrs = lookup(&self.resolver, &host).await?;
        let mut errors = Vec::with_capacity(addrs.len());
        for ip in addrs {
            let target = join_host_port(&ip.to_string(), port);
            match self.dialer.dial(network, &target).await {
                Ok(conn) => return Ok(conn),
                Err(err) => errors.push(err),
            }
        }
        Err(reduce_errors(errors))
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections();
        self.resolver.close_idle_connections();
    }
}
