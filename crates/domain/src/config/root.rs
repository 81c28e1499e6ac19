use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use super::errors::ConfigError;
use super::logging::{default_log_level, LoggingConfig};
use super::upstream::{validate_host_port, RawUpstream};
use crate::dns_record::RecordType;
use crate::upstream::Upstream;
use ipnetwork::Ipv6Network;

pub const DEFAULT_NAT64_PREFIX: &str = "64:ff9b::/96";

const NAT64_PREFIX_LENGTHS: [u8; 6] = [32, 40, 48, 56, 64, 96];

/// The JSON document exactly as it is written on disk.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawConfig {
    #[serde(rename = "BindAddress", default = "default_bind_address")]
    pub bind_address: String,

    #[serde(rename = "PrimaryDNS", default)]
    pub primary_dns: Vec<RawUpstream>,

    #[serde(rename = "AlternativeDNS", default)]
    pub alternative_dns: Vec<RawUpstream>,

    #[serde(rename = "OnlyPrimaryDNS", default)]
    pub only_primary_dns: bool,

    #[serde(rename = "RedirectIPv6Record", default)]
    pub redirect_ipv6_record: bool,

    #[serde(rename = "RedirectIPv6Prefix", default = "default_nat64_prefix")]
    pub redirect_ipv6_prefix: String,

    #[serde(rename = "IPNetworkFile", default)]
    pub ip_network_file: String,

    #[serde(rename = "DomainFile", default)]
    pub domain_file: String,

    #[serde(rename = "DomainBase64Decode", default)]
    pub domain_base64_decode: bool,

    #[serde(rename = "DomainCutoffMarker", default = "default_cutoff_marker")]
    pub domain_cutoff_marker: String,

    #[serde(rename = "HostsFile", default)]
    pub hosts_file: String,

    #[serde(rename = "MinimumTTL", default)]
    pub minimum_ttl: u32,

    #[serde(rename = "CacheSize", default)]
    pub cache_size: usize,

    #[serde(rename = "RejectQtype", default)]
    pub reject_qtype: Vec<u16>,

    #[serde(rename = "LogLevel", default = "default_log_level")]
    pub log_level: String,
}

/// Command-line overrides applied while finalizing.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub socks5_address: Option<String>,
    pub log_level: Option<String>,
}

/// Validated, immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub primary: Vec<Upstream>,
    pub alternative: Vec<Upstream>,
    pub only_primary: bool,
    pub redirect_ipv6_record: bool,
    pub redirect_ipv6_prefix: Ipv6Network,
    pub ip_network_file: Option<PathBuf>,
    pub domain_file: Option<PathBuf>,
    pub domain_base64_decode: bool,
    pub domain_cutoff_marker: String,
    pub hosts_file: Option<PathBuf>,
    pub minimum_ttl: u32,
    /// Zero disables the cache.
    pub cache_size: usize,
    pub reject_qtypes: Vec<RecordType>,
    pub logging: LoggingConfig,
}

impl Config {
    /// Read, parse and finalize the JSON document at `path`.
    pub fn load(path: &str, overrides: Overrides) -> Result<Self, ConfigError> {
        RawConfig::from_file(path)?.finalize(overrides)
    }
}

impl RawConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn finalize(self, overrides: Overrides) -> Result<Config, ConfigError> {
        let bind_address = parse_bind_address(&self.bind_address)?;

        if self.primary_dns.is_empty() {
            return Err(ConfigError::Validation(
                "PrimaryDNS must contain at least one upstream".to_string(),
            ));
        }
        if self.alternative_dns.is_empty() && !self.only_primary_dns {
            return Err(ConfigError::Validation(
                "AlternativeDNS must contain at least one upstream unless OnlyPrimaryDNS is set"
                    .to_string(),
            ));
        }

        let socks5 = overrides
            .socks5_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(proxy) = socks5 {
            validate_host_port(proxy).map_err(|reason| {
                ConfigError::Validation(format!("SOCKS5 override: {}", reason))
            })?;
        }

        let primary = self
            .primary_dns
            .iter()
            .map(|u| u.finalize(socks5))
            .collect::<Result<Vec<_>, _>>()?;
        let alternative = self
            .alternative_dns
            .iter()
            .map(|u| u.finalize(socks5))
            .collect::<Result<Vec<_>, _>>()?;

        let redirect_ipv6_prefix = parse_nat64_prefix(&self.redirect_ipv6_prefix)?;

        let logging = LoggingConfig::new(overrides.log_level.as_deref().unwrap_or(&self.log_level))?;

        let mut reject_qtypes: Vec<RecordType> = Vec::with_capacity(self.reject_qtype.len());
        for code in &self.reject_qtype {
            let record_type = RecordType::from_u16(*code);
            if !reject_qtypes.contains(&record_type) {
                reject_qtypes.push(record_type);
            }
        }

        Ok(Config {
            bind_address,
            primary,
            alternative,
            only_primary: self.only_primary_dns,
            redirect_ipv6_record: self.redirect_ipv6_record,
            redirect_ipv6_prefix,
            ip_network_file: optional_path(&self.ip_network_file),
            domain_file: optional_path(&self.domain_file),
            domain_base64_decode: self.domain_base64_decode,
            domain_cutoff_marker: self.domain_cutoff_marker,
            hosts_file: optional_path(&self.hosts_file),
            minimum_ttl: self.minimum_ttl,
            cache_size: self.cache_size,
            reject_qtypes,
            logging,
        })
    }
}

/// `:53` binds every IPv4 interface.
fn parse_bind_address(raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    let expanded = if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    };
    expanded.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid BindAddress '{}': {}", raw, e))
    })
}

fn parse_nat64_prefix(raw: &str) -> Result<Ipv6Network, ConfigError> {
    let network = raw.trim().parse::<Ipv6Network>().map_err(|e| {
        ConfigError::Validation(format!("Invalid RedirectIPv6Prefix '{}': {}", raw, e))
    })?;
    if !NAT64_PREFIX_LENGTHS.contains(&network.prefix()) {
        return Err(ConfigError::Validation(format!(
            "RedirectIPv6Prefix length /{} is not one of 32, 40, 48, 56, 64, 96",
            network.prefix()
        )));
    }
    // Keep only the network bits so host bits in the config never leak into
    // synthesized addresses.
    Ipv6Network::new(network.network(), network.prefix())
        .map_err(|e| ConfigError::Validation(format!("Invalid RedirectIPv6Prefix: {}", e)))
}

fn optional_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        Some(PathBuf::from(raw))
    }
}

fn default_bind_address() -> String {
    ":53".to_string()
}

fn default_nat64_prefix() -> String {
    DEFAULT_NAT64_PREFIX.to_string()
}

fn default_cutoff_marker() -> String {
    "Whitelist Start".to_string()
}
