//! One place to configure the whole stack.
//!
//! [`NetConfig`] collects the resolver, DNS policy and TLS knobs and
//! builds resolvers and dialers from them. It can be loaded from JSON:
//!
//! ```json
//! {
//!   "resolver_url": "dot://dns.google",
//!   "bogon_is_error": true,
//!   "address_family": "inet"
//! }
//! ```

use crate::base::logger::{default_logger, SharedLogger};
use crate::base::neterror::NetError;
use crate::dns::compose::{new_unwrapped_resolver, wrap_resolver, TransportDeps};
use crate::dns::{AddressFamily, AddressFamilyResolver, BogonResolver, CacheResolver, SharedResolver};
use crate::quic::{new_quic_dialer, SharedQuicDialer};
use crate::socket::tls::{new_tls_dialer, new_tls_handshaker, RootStore, SharedTlsDialer, TlsConfig};
use crate::socket::{new_dialer, SharedDialer};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

fn default_resolver_url() -> String {
    "system:///".to_string()
}

/// Network stack configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// `system:///`, `udp://host:port`, `tcp://host:port`,
    /// `dot://host:port` or `https://host/path`.
    pub resolver_url: String,

    /// Fail lookups returning private, loopback or otherwise reserved
    /// addresses.
    pub bogon_is_error: bool,

    /// Remember successful lookups.
    pub cache_resolutions: bool,

    /// Static hostname-to-addresses map. When non-empty, these entries are
    /// served read-only and nothing else is cached.
    pub dns_cache: HashMap<String, Vec<IpAddr>>,

    /// Only return addresses of this family.
    pub address_family: Option<AddressFamily>,

    /// PEM bundle replacing the default roots.
    pub root_ca_path: Option<PathBuf>,

    /// Skip certificate and hostname verification.
    pub no_tls_verify: bool,

    #[serde(skip, default = "default_logger")]
    pub logger: SharedLogger,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            resolver_url: default_resolver_url(),
            bogon_is_error: false,
            cache_resolutions: false,
            dns_cache: HashMap::new(),
            address_family: None,
            root_ca_path: None,
            no_tls_verify: false,
            logger: default_logger(),
        }
    }
}

impl fmt::Debug for NetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetConfig")
            .field("resolver_url", &self.resolver_url)
            .field("bogon_is_error", &self.bogon_is_error)
            .field("cache_resolutions", &self.cache_resolutions)
            .field("dns_cache_count", &self.dns_cache.len())
            .field("address_family", &self.address_family)
            .field("root_ca_path", &self.root_ca_path)
            .field("no_tls_verify", &self.no_tls_verify)
            .finish_non_exhaustive()
    }
}

impl NetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the resolver URL.
    pub fn resolver_url(mut self, url: impl Into<String>) -> Self {
        self.resolver_url = url.into();
        self
    }

    /// Sets whether bogon answers fail the lookup.
    pub fn bogon_is_error(mut self, enabled: bool) -> Self {
        self.bogon_is_error = enabled;
        self
    }

    /// Sets whether successful lookups are cached.
    pub fn cache_resolutions(mut self, enabled: bool) -> Self {
        self.cache_resolutions = enabled;
        self
    }

    /// Adds a static entry, replacing any previous one for `domain`.
    pub fn dns_cache_entry(mut self, domain: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        self.dns_cache.insert(domain.into(), addrs);
        self
    }

    /// Keeps only addresses of `family`.
    pub fn address_family(mut self, family: AddressFamily) -> Self {
        self.address_family = Some(family);
        self
    }

    /// Sets the PEM bundle to trust instead of the bundled roots.
    pub fn root_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_ca_path = Some(path.into());
        self
    }

    /// Sets whether certificate verification is skipped.
    pub fn no_tls_verify(mut self, skip: bool) -> Self {
        self.no_tls_verify = skip;
        self
    }

    /// Sets the logger handed to every decorator.
    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// TLS settings shared by the TLS and QUIC dialers.
    pub fn tls_config(&self) -> Result<TlsConfig, NetError> {
        let mut config = TlsConfig::new().insecure_skip_verify(self.no_tls_verify);
        if let Some(path) = &self.root_ca_path {
            config = config.root_certs(RootStore::from_pem_file(path)?);
        }
        Ok(config)
    }

    /// Builds the resolver:
    /// `Cache(Bogon(Family(IDNA(Logging(ShortCircuit(ErrWrap(base)))))))`,
    /// with the optional layers present only when enabled.
    pub fn build_resolver(&self) -> Result<SharedResolver, NetError> {
        let mut deps = TransportDeps::new(self.logger.clone())?;
        deps.tls_config = self.tls_config()?;
        let base = new_unwrapped_resolver(&self.resolver_url, &deps)?;

        let mut resolver = wrap_resolver(base, self.logger.clone());
        if let Some(family) = self.address_family {
            resolver = Arc::new(AddressFamilyResolver::new(resolver, family));
        }
        if self.bogon_is_error {
            resolver = Arc::new(BogonResolver::new(resolver));
        }
        if !self.dns_cache.is_empty() {
            resolver = Arc::new(CacheResolver::read_only(resolver, self.dns_cache.clone()));
        } else if self.cache_resolutions {
            resolver = Arc::new(CacheResolver::new(resolver));
        }
        tracing::debug!(url = %self.resolver_url, "resolver ready");
        Ok(resolver)
    }

    pub fn build_dialer(&self) -> Result<SharedDialer, NetError> {
        Ok(new_dialer(self.build_resolver()?, self.logger.clone()))
    }

    pub fn build_tls_dialer(&self) -> Result<SharedTlsDialer, NetError> {
        Ok(new_tls_dialer(
            self.build_dialer()?,
            new_tls_handshaker(self.logger.clone())?,
            self.tls_config()?,
        ))
    }

    /// QUIC dialer. Pass [`tls_config`](Self::tls_config) to each dial.
    pub fn build_quic_dialer(&self) -> Result<SharedQuicDialer, NetError> {
        Ok(new_quic_dialer(self.build_resolver()?, self.logger.clone()))
    }
}
