//! `host:port` endpoint helpers.

use crate::base::neterror::NetError;
use std::net::IpAddr;
use url::{Host, Url};

fn invalid(address: &str, reason: &str) -> NetError {
    NetError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

/// Splits `host:port` or `[ipv6]:port` into its host and port.
pub fn split_host_port(address: &str) -> Result<(String, u16), NetError> {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| invalid(address, "missing ']' in address"))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| invalid(address, "missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid(address, "missing port in address"))?;
        if host.contains(':') {
            return Err(invalid(address, "too many colons in address"));
        }
        (host, port)
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid(address, "invalid port"))?;
    Ok((host.to_string(), port))
}

/// Joins a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Parses `host` as an IP literal, accepting a bracketed IPv6 address.
pub fn parse_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

/// Host and port of `url`, falling back to `default_port`. IPv6 hosts are
/// returned without brackets.
pub fn url_host_port(url: &Url, default_port: u16) -> Result<(String, u16), NetError> {
    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        _ => return Err(invalid(url.as_str(), "missing host")),
    };
    Ok((host, url.port_or_known_default().unwrap_or(default_port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("dns.google:853").unwrap(),
            ("dns.google".to_string(), 853)
        );
        assert_eq!(
            split_host_port("[2001:db8::1]:443").unwrap(),
            ("2001:db8::1".to_string(), 443)
        );
        assert_eq!(
            split_host_port("1.1.1.1:53").unwrap(),
            ("1.1.1.1".to_string(), 53)
        );
    }

    #[test]
    fn test_split_host_port_errors() {
        for bad in ["dns.google", "2001:db8::1:443", "[::1]", "[::1:443", "x:https", "x:70000"] {
            assert!(
                matches!(split_host_port(bad), Err(NetError::InvalidAddress { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("8.8.8.8", 53), "8.8.8.8:53");
        assert_eq!(join_host_port("::1", 853), "[::1]:853");
        assert_eq!(join_host_port("example.com", 443), "example.com:443");
    }

    #[test]
    fn test_parse_ip() {
        assert!(parse_ip("8.8.8.8").is_some());
        assert!(parse_ip("::1").is_some());
        assert!(parse_ip("[::1]").is_some());
        assert!(parse_ip("example.com").is_none());
    }

    #[test]
    fn test_url_host_port() {
        let url = Url::parse("dot://dns.google").unwrap();
        assert_eq!(url_host_port(&url, 853).unwrap(), ("dns.google".to_string(), 853));

        let url = Url::parse("udp://[2001:4860:4860::8888]:5353").unwrap();
        assert_eq!(
            url_host_port(&url, 53).unwrap(),
            ("2001:4860:4860::8888".to_string(), 5353)
        );

        let url = Url::parse("https://1.1.1.1/dns-query").unwrap();
        assert_eq!(url_host_port(&url, 0).unwrap(), ("1.1.1.1".to_string(), 443));

        let url = Url::parse("system:///").unwrap();
        assert!(url_host_port(&url, 53).is_err());
    }
}
