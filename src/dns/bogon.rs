//! Bogon detection.
//!
//! A bogon is an address that must not appear in a public DNS answer:
//! private, reserved, documentation, loopback or link-local space. Seeing
//! one is a common symptom of DNS-based blocking.

use crate::base::neterror::NetError;
use crate::dns::resolve::{HttpsSvc, Resolver, SharedResolver};
use async_trait::async_trait;
use ipnet::IpNet;
use std::net::IpAddr;
use std::sync::OnceLock;

const BOGONS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "255.255.255.255/32",
    "::/128",
    "::1/128",
    "::ffff:0:0/96",
    "100::/64",
    "2001:10::/28",
    "2001:db8::/32",
    "fc00::/7",
    "fe80::/10",
    "ff00::/8",
];

fn bogon_nets() -> &'static [IpNet] {
    static NETS: OnceLock<Vec<IpNet>> = OnceLock::new();
    NETS.get_or_init(|| BOGONS.iter().filter_map(|net| net.parse().ok()).collect())
}

/// Returns true if `ip` is a bogon.
pub fn is_bogon(ip: IpAddr) -> bool {
    if ip.is_loopback() || is_link_local(ip) {
        return true;
    }
    bogon_nets().iter().any(|net| net.contains(&ip))
}

fn is_link_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local() || v4.is_multicast(),
        IpAddr::V6(v6) => {
            let seg = v6.segments()[0];
            (seg & 0xffc0) == 0xfe80 || (seg & 0xff0f) == 0xff02
        }
    }
}

/// Like [`is_bogon`], for a textual address. Non-IP input is not a bogon.
pub fn is_bogon_str(candidate: &str) -> bool {
    candidate.parse().map(is_bogon).unwrap_or(false)
}

/// Fails the lookup when any returned address is a bogon.
pub struct BogonResolver {
    resolver: SharedResolver,
}

impl BogonResolver {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Resolver for BogonResolver {
    async fn lookup_host(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let addrs = self.resolver.lookup_host(domain).await?;
        if let Some(bogon) = addrs.iter().find(|ip| is_bogon(**ip)) {
            tracing::debug!(domain = %domain, bogon = %bogon, "bogon in answer");
            return Err(NetError::Bogon);
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
