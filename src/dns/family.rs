//! Address-family filtering.

use crate::base::classify::classify_resolver_error;
use crate::base::errwrapper::WrappedError;
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// An IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Inet,
    Inet6,
}

impl AddressFamily {
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::Inet => ip.is_ipv4(),
            AddressFamily::Inet6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressFamily::Inet => "inet",
            AddressFamily::Inet6 => "inet6",
        })
    }
}

impl FromStr for AddressFamily {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inet" | "ipv4" | "4" => Ok(AddressFamily::Inet),
            "inet6" | "ipv6" | "6" => Ok(AddressFamily::Inet6),
            other => Err(NetError::InvalidConfig(format!(
                "unknown address family {other:?}"
            ))),
        }
    }
}

/// Keeps only the addresses of one family.
pub struct AddressFamilyResolver {
    resolver: SharedResolver,
    family: AddressFamily,
}

impl AddressFamilyResolver {
    pub fn new(resolver: SharedResolver, family: AddressFamily) -> Self {
        Self { resolver, family }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }
}

#[async_trait]
impl Resolver for AddressFamilyResolver {
    /// An answer with no address of the wanted family fails with a wrapped
    /// "no answer".
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let addrs: Vec<IpAddr> = self
            .resolver
            .lookup_host(domain)
            .await?
            .into_iter()
            .filter(|ip| self.family.matches(ip))
            .collect();
        if addrs.is_empty() {
            return Err(NetError::Wrapped(WrappedError::new(
                classify_resolver_error,
                Operation::Resolve,
                NetError::NoAnswer,
            )));
        }
        Ok(addrs)
    }

    async fn lookup_https(&self, domain: &str) -> Result<HttpsSvc, NetError> {
        self.resolver.lookup_https(domain).await
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, NetError> {
        self.resolver.lookup_ns(domain).await
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
