//! DNS over HTTPS (RFC 8484), `POST` over HTTP/1.1.

use super::DnsTransport;
use crate::base::errwrapper::WrappedError;
use crate::base::neterror::NetError;
use crate::dns::codec::{DnsQuery, DnsResponse};
use crate::socket::address::{join_host_port, url_host_port};
use crate::socket::tls::SharedTlsDialer;
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::error::Error as _;
use std::io;
use std::time::Duration;
use url::Url;

/// Upper bound on reading the response, independent of the caller's deadline.
pub const HTTP_READ_TIMEOUT: Duration = Duration::from_secs(300);

const DNS_MESSAGE: &str = "application/dns-message";

/// Sends each query over a fresh HTTP/1.1 connection.
///
/// The TLS dialer should offer `http/1.1` as its only ALPN protocol.
pub struct HttpsTransport {
    dialer: SharedTlsDialer,
    url: Url,
    address: String,
    authority: String,
    dial_address: String,
}

impl HttpsTransport {
    /// Creates a transport for `url`, e.g. `https://dns.google/dns-query`.
    pub fn new(dialer: SharedTlsDialer, url: &str) -> Result<Self, NetError> {
        let invalid = |reason: &str| NetError::InvalidAddress {
            address: url.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "https" {
            return Err(invalid("scheme must be https"));
        }
        let (host, port) = url_host_port(&parsed, 443)?;
        let authority = match parsed.port() {
            Some(port) => join_host_port(&host, port),
            None if host.contains(':') => format!("[{host}]"),
            None => host.clone(),
        };
        Ok(Self {
            dialer,
            address: url.to_string(),
            authority,
            dial_address: join_host_port(&host, port),
            url: parsed,
        })
    }

    fn request(&self, body: Vec<u8>) -> Result<Request<Full<Bytes>>, NetError> {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        Request::builder()
            .method(Method::POST)
            .uri(target)
            .header(header::HOST, &self.authority)
            .header(header::CONTENT_TYPE, DNS_MESSAGE)
            .header(header::ACCEPT, DNS_MESSAGE)
            .header(header::USER_AGENT, concat!("probenet/", env!("CARGO_PKG_VERSION")))
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| NetError::Http(e.to_string()))
    }

    async fn exchange(&self, raw: Vec<u8>) -> Result<Vec<u8>, NetError> {
        let (conn, state) = self.dialer.dial_tls("tcp", &self.dial_address).await?;
        if !state.negotiated_protocol.is_empty() && state.negotiated_protocol != "http/1.1" {
            return Err(NetError::Http(format!(
                "unsupported ALPN protocol {:?}",
                state.negotiated_protocol
            )));
        }

        let (mut sender, connection) = http1::handshake(TokioIo::new(conn))
            .await
            .map_err(hyper_error)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::trace!(error = %e, "doh connection closed");
            }
        });

        let request = self.request(raw)?;
        tokio::time::timeout(HTTP_READ_TIMEOUT, async {
            let response = sender.send_request(request).await.map_err(hyper_error)?;
            if response.status() != StatusCode::OK {
                return Err(NetError::HttpStatus(response.status().as_u16()));
            }
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if content_type != DNS_MESSAGE {
                return Err(NetError::HttpContentType(content_type));
            }
            let body = response.into_body().collect().await.map_err(hyper_error)?;
            Ok(body.to_bytes().to_vec())
        })
        .await?
    }
}

/// Recovers a classified I/O error buried in hyper's source chain.
fn hyper_error(err: hyper::Error) -> NetError {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(wrapped) = io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<WrappedError>())
            {
                return NetError::Wrapped(wrapped.clone());
            }
            if io_err.kind() == io::ErrorKind::UnexpectedEof {
                return NetError::Eof;
            }
        }
        source = cause.source();
    }
    if err.is_incomplete_message() {
        return NetError::Eof;
    }
    NetError::Http(err.to_string())
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn round_trip(&self, query: &DnsQuery) -> Result<DnsResponse, NetError> {
        let raw = query.encode(self.requires_padding())?;
        tracing::trace!(url = %self.address, id = query.id(), "doh query");
        let reply = self.exchange(raw).await?;
        DnsResponse::decode(query, reply)
    }

    fn requires_padding(&self) -> bool {
        true
    }

    fn network(&self) -> &str {
        "doh"
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn close_idle_connections(&self) {
        self.dialer.close_idle_connections()
    }
}
