//! TLS configuration, handshakers and the TLS dialer.
//!
//! - [`TlsConfig`]: per-connection client settings
//! - [`handshaker`]: BoringSSL handshaker plus logging/error-wrapping layers
//! - [`dialer`]: plain dial followed by a handshake
//! - [`certs`]: the bundled trust store

use crate::base::neterror::{NetError, TlsError};
use boring::ssl::{SslCipherRef, SslConnector, SslMethod, SslVerifyMode, SslVersion};

pub mod certs;
pub mod dialer;
pub mod handshaker;

pub use self::certs::RootStore;
pub use self::dialer::{new_tls_dialer, NullTlsDialer, SharedTlsDialer, TlsDialer, TlsStdDialer};
pub use self::handshaker::{
    new_tls_handshaker, wrap_tls_handshaker, BoringHandshaker, ErrWrapHandshaker,
    LoggingHandshaker, SharedTlsHandshaker, TlsConnectionState, TlsHandshaker,
    TLS_HANDSHAKE_TIMEOUT,
};

fn config_err(reason: impl std::fmt::Display) -> NetError {
    NetError::Tls(TlsError::Config(reason.to_string()))
}

/// Client-side TLS settings.
///
/// Unset fields are filled in per connection by the TLS dialer: the server
/// name defaults to the dialed host, ALPN depends on the port, and the
/// bundled roots are used when `root_certs` is `None`.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub server_name: Option<String>,
    pub alpn_protocols: Vec<String>,
    pub root_certs: Option<RootStore>,
    pub insecure_skip_verify: bool,
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
}

impl TlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn alpn_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alpn_protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn root_certs(mut self, roots: RootStore) -> Self {
        self.root_certs = Some(roots);
        self
    }

    /// Disables certificate and hostname verification.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    pub fn min_version(mut self, version: SslVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn max_version(mut self, version: SslVersion) -> Self {
        self.max_version = Some(version);
        self
    }

    /// ALPN list in wire format: each protocol prefixed by its length.
    pub fn alpn_wire(&self) -> Result<Vec<u8>, NetError> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protocols {
            let len = u8::try_from(proto.len())
                .ok()
                .filter(|len| *len > 0)
                .ok_or_else(|| config_err(format!("invalid ALPN protocol {proto:?}")))?;
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Builds a connector trusting exactly `roots`.
    pub(crate) fn connector(&self, roots: &RootStore) -> Result<SslConnector, NetError> {
        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(config_err)?;
        builder
            .set_min_proto_version(Some(self.min_version.unwrap_or(SslVersion::TLS1_2)))
            .map_err(config_err)?;
        builder
            .set_max_proto_version(self.max_version)
            .map_err(config_err)?;
        if !self.alpn_protocols.is_empty() {
            builder
                .set_alpn_protos(&self.alpn_wire()?)
                .map_err(config_err)?;
        }
        builder.set_cert_store_ref(roots.store());
        builder.set_verify(if self.insecure_skip_verify {
            SslVerifyMode::NONE
        } else {
            SslVerifyMode::PEER
        });
        Ok(builder.build())
    }
}

/// Default ALPN for a TLS connection to `port`: HTTP on 443, DNS over TLS
/// on 853, nothing otherwise.
pub fn default_alpn_for_port(port: u16) -> Vec<String> {
    match port {
        443 => vec!["h2".to_string(), "http/1.1".to_string()],
        853 => vec!["dot".to_string()],
        _ => Vec::new(),
    }
}

/// Human-readable protocol version, e.g. `TLSv1.3`. Empty for `None`.
pub fn tls_version_string(version: Option<SslVersion>) -> String {
    let Some(version) = version else {
        return String::new();
    };
    let name = if version == SslVersion::TLS1_3 {
        "TLSv1.3"
    } else if version == SslVersion::TLS1_2 {
        "TLSv1.2"
    } else if version == SslVersion::TLS1_1 {
        "TLSv1.1"
    } else if version == SslVersion::TLS1 {
        "TLSv1"
    } else {
        "TLS_VERSION_UNKNOWN"
    };
    name.to_string()
}

/// Name of the negotiated cipher suite. Empty when none was negotiated.
pub fn tls_cipher_suite_string(cipher: Option<&SslCipherRef>) -> String {
    cipher.map(|c| c.name().to_string()).unwrap_or_default()
}
