//! Trust anchors for TLS verification.

use crate::base::neterror::{NetError, TlsError};
use boring::x509::store::{X509Store, X509StoreBuilder};
use boring::x509::X509;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Mozilla CA bundle shipped with the crate.
const BUNDLED_PEM: &[u8] = include_bytes!("cacert.pem");

static BUNDLED: LazyLock<Result<RootStore, NetError>> =
    LazyLock::new(|| RootStore::from_pem(BUNDLED_PEM));

fn config_err(reason: impl fmt::Display) -> NetError {
    NetError::Tls(TlsError::Config(reason.to_string()))
}

/// An immutable set of root certificates.
///
/// The BoringSSL store is built once, when the set is loaded, and shared by
/// every connector and clone.
#[derive(Clone)]
pub struct RootStore {
    certs: Arc<Vec<X509>>,
    store: Arc<X509Store>,
}

impl RootStore {
    /// The bundled CA set. Parsed on first use.
    pub fn bundled() -> Result<Self, NetError> {
        BUNDLED.clone()
    }

    /// Parses every certificate in a PEM bundle. Fails if there is none.
    pub fn from_pem(pem: &[u8]) -> Result<Self, NetError> {
        let certs = X509::stack_from_pem(pem).map_err(config_err)?;
        if certs.is_empty() {
            return Err(config_err("no certificates found in PEM bundle"));
        }
        let store = build_store(&certs)?;
        Ok(Self {
            certs: Arc::new(certs),
            store: Arc::new(store),
        })
    }

    /// Reads and parses a PEM bundle from disk.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, NetError> {
        let pem = std::fs::read(path.as_ref())?;
        Self::from_pem(&pem)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn certs(&self) -> &[X509] {
        &self.certs
    }

    pub(crate) fn store(&self) -> &X509Store {
        &self.store
    }
}

fn build_store(certs: &[X509]) -> Result<X509Store, NetError> {
    let mut builder = X509StoreBuilder::new().map_err(config_err)?;
    for cert in certs {
        if let Err(e) = builder.add_cert(cert.clone()) {
            tracing::trace!(error = %e, "skipping root certificate");
        }
    }
    Ok(builder.build())
}

impl fmt::Debug for RootStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootStore")
            .field("len", &self.certs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_roots_load() {
        let roots = RootStore::bundled().unwrap();
        assert!(roots.len() > 100, "only {} roots", roots.len());
    }

    #[test]
    fn test_store_is_shared() {
        let a = RootStore::bundled().unwrap();
        let b = RootStore::bundled().unwrap();
        assert!(std::ptr::eq(a.store(), b.store()));

        let custom = RootStore::from_pem(
            rcgen::generate_simple_self_signed(vec!["localhost".into()])
                .unwrap()
                .cert
                .pem()
                .as_bytes(),
        )
        .unwrap();
        let copy = custom.clone();
        assert!(std::ptr::eq(custom.store(), copy.store()));
        assert!(!std::ptr::eq(custom.store(), a.store()));
    }

    #[test]
    fn test_from_pem_rejects_empty() {
        assert!(RootStore::from_pem(b"").is_err());
        assert!(RootStore::from_pem(b"not a certificate").is_err());
    }

    #[test]
    fn test_from_pem_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let pem = rcgen::generate_simple_self_signed(vec!["localhost".into()])
            .unwrap()
            .cert
            .pem();
        file.write_all(pem.as_bytes()).unwrap();

        let roots = RootStore::from_pem_file(file.path()).unwrap();
        assert_eq!(roots.len(), 1);
        assert!(format!("{roots:?}").contains("len: 1"));
    }

    #[test]
    fn test_from_pem_file_missing() {
        let err = RootStore::from_pem_file("/nonexistent/ca.pem").unwrap_err();
        assert!(matches!(err, NetError::Io(_)));
    }
}
