//! QUIC transport configuration.

use crate::base::neterror::NetError;
use quinn::{IdleTimeout, TransportConfig, VarInt};
use std::time::Duration;

/// Transport parameters for a QUIC connection.
///
/// TLS settings (server name, ALPN, roots) come from the
/// [`TlsConfig`](crate::socket::tls::TlsConfig) passed next to it.
#[derive(Debug, Clone)]
pub struct QuicConfig {
    /// Maximum idle timeout. Also bounds the handshake.
    pub idle_timeout: Duration,
    /// Initial RTT estimate
    pub initial_rtt: Duration,
    /// Initial UDP payload size
    pub initial_mtu: u16,
    /// Connection-level receive window
    pub initial_max_data: u64,
    /// Stream-level receive window
    pub initial_max_stream_data: u64,
    pub initial_max_streams_bidi: u32,
    pub initial_max_streams_uni: u32,
    /// Keep-alive interval, disabled when `None`.
    pub keep_alive_interval: Option<Duration>,
}

impl Default for QuicConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            initial_rtt: Duration::from_millis(100),
            initial_mtu: 1200,
            initial_max_data: 10 * 1024 * 1024,   // 10 MB
            initial_max_stream_data: 1024 * 1024, // 1 MB
            initial_max_streams_bidi: 100,
            initial_max_streams_uni: 100,
            keep_alive_interval: None,
        }
    }
}

impl QuicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn initial_rtt(mut self, rtt: Duration) -> Self {
        self.initial_rtt = rtt;
        self
    }

    pub fn initial_mtu(mut self, size: u16) -> Self {
        self.initial_mtu = size;
        self
    }

    pub fn initial_max_data(mut self, max: u64) -> Self {
        self.initial_max_data = max;
        self
    }

    pub fn initial_max_stream_data(mut self, max: u64) -> Self {
        self.initial_max_stream_data = max;
        self
    }

    pub fn initial_max_streams(mut self, bidi: u32, uni: u32) -> Self {
        self.initial_max_streams_bidi = bidi;
        self.initial_max_streams_uni = uni;
        self
    }

    pub fn keep_alive_interval(mut self, interval: Option<Duration>) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Converts to quinn's transport parameters.
    pub fn transport_config(&self) -> Result<TransportConfig, NetError> {
        let invalid = |what: &str| NetError::InvalidConfig(format!("quic: {what} out of range"));
        let idle = IdleTimeout::try_from(self.idle_timeout).map_err(|_| invalid("idle_timeout"))?;
        let data = VarInt::from_u64(self.initial_max_data).map_err(|_| invalid("initial_max_data"))?;
        let stream_data = VarInt::from_u64(self.initial_max_stream_data)
            .map_err(|_| invalid("initial_max_stream_data"))?;

        let mut transport = TransportConfig::default();
        transport
            .max_idle_timeout(Some(idle))
            .initial_rtt(self.initial_rtt)
            .initial_mtu(self.initial_mtu)
            .receive_window(data)
            .stream_receive_window(stream_data)
            .max_concurrent_bidi_streams(VarInt::from_u32(self.initial_max_streams_bidi))
            .max_concurrent_uni_streams(VarInt::from_u32(self.initial_max_streams_uni))
            .keep_alive_interval(self.keep_alive_interval);
        Ok(transport)
    }
}

/// Default ALPN for a QUIC connection to `port`: HTTP/3 on 443, DNS over
/// QUIC on 8853, nothing otherwise.
pub fn default_quic_alpn_for_port(port: u16) -> Vec<String> {
    match port {
        443 => vec!["h3".to_string()],
        8853 => vec!["dq".to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QuicConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert!(config.keep_alive_interval.is_none());
        assert!(config.transport_config().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = QuicConfig::new()
            .idle_timeout(Duration::from_secs(5))
            .initial_max_data(5 * 1024 * 1024)
            .initial_max_streams(4, 2)
            .keep_alive_interval(Some(Duration::from_secs(1)));

        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.initial_max_data, 5 * 1024 * 1024);
        assert_eq!(config.initial_max_streams_bidi, 4);
        assert!(config.transport_config().is_ok());
    }

    #[test]
    fn test_out_of_range_values() {
        let config = QuicConfig::new().initial_max_data(u64::MAX);
        assert!(matches!(
            config.transport_config(),
            Err(NetError::InvalidConfig(ref s)) if s.contains("initial_max_data")
        ));
    }

    #[test]
    fn test_default_alpn() {
        assert_eq!(default_quic_alpn_for_port(443), vec!["h3"]);
        assert_eq!(default_quic_alpn_for_port(8853), vec!["dq"]);
        assert!(default_quic_alpn_for_port(853).is_empty());
    }
}
