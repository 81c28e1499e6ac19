//! Ferrous Split Domain Layer
pub mod answer;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod domain_list;
pub mod errors;
pub mod hosts;
pub mod ip_network_list;
pub mod upstream;

pub use answer::{Answer, ResponseCode};
pub use config::{Config, ConfigError, LoggingConfig, Overrides, RawConfig};
pub use dns_query::{DnsClass, DnsQuery};
pub use dns_record::{RecordData, RecordType, ResourceRecord};
pub use domain_list::DomainList;
pub use errors::{DomainError, ResourceLoadError};
pub use hosts::HostsTable;
pub use ip_network_list::IpNetworkList;
pub use upstream::{Upstream, UpstreamProtocol};
