use super::errors::ConfigError;
use crate::upstream::{Upstream, UpstreamProtocol};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream entry as written in the JSON document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawUpstream {
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Protocol", default = "default_protocol")]
    pub protocol: String,

    #[serde(rename = "SOCKS5Address", default)]
    pub socks5_address: String,

    /// Seconds.
    #[serde(rename = "Timeout", default = "default_timeout")]
    pub timeout: u64,
}

impl RawUpstream {
    pub(crate) fn finalize(&self, socks5_override: Option<&str>) -> Result<Upstream, ConfigError> {
        let protocol = UpstreamProtocol::parse(&self.protocol).ok_or_else(|| {
            ConfigError::Validation(format!(
                "Upstream '{}' has unsupported protocol '{}' (expected udp or tcp)",
                self.label(),
                self.protocol
            ))
        })?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation(format!(
                "Upstream '{}' timeout must be greater than 0",
                self.label()
            )));
        }

        let address = self.address.trim();
        validate_host_port(address).map_err(|reason| {
            ConfigError::Validation(format!("Upstream '{}' address: {}", self.label(), reason))
        })?;

        let name = if self.name.trim().is_empty() {
            address
        } else {
            self.name.trim()
        };
        let mut upstream = Upstream::new(
            name,
            address,
            protocol,
            Duration::from_secs(self.timeout),
        );

        let proxy = socks5_override.unwrap_or(self.socks5_address.trim());
        if !proxy.is_empty() {
            validate_host_port(proxy).map_err(|reason| {
                ConfigError::Validation(format!(
                    "Upstream '{}' SOCKS5 address: {}",
                    self.label(),
                    reason
                ))
            })?;
            upstream = upstream.with_socks5(proxy);
        }

        Ok(upstream)
    }

    fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}

/// Accepts `ip:port`, `[ipv6]:port` and `hostname:port`.
pub(crate) fn validate_host_port(address: &str) -> Result<(), String> {
    if address.parse::<std::net::SocketAddr>().is_ok() {
        return Ok(());
    }
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is not in host:port form", address))?;
    if host.is_empty() || host.contains(':') || host.contains(char::is_whitespace) {
        return Err(format!("'{}' has an invalid host", address));
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(format!("'{}' has an invalid port", address)),
    }
}

fn default_protocol() -> String {
    "udp".to_string()
}

fn default_timeout() -> u64 {
    6
}
