#![allow(dead_code)]
use ferrous_split_domain::{Answer, RecordData, ResourceRecord, ResponseCode};
use std::net::Ipv4Addr;

pub struct AnswerBuilder {
    rcode: ResponseCode,
    records: Vec<ResourceRecord>,
}

impl AnswerBuilder {
    pub fn new() -> Self {
        Self {
            rcode: ResponseCode::NoError,
            records: vec![],
        }
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn a(mut self, name: &str, ip: [u8; 4], ttl: u32) -> Self {
        self.records
            .push(ResourceRecord::new(name, ttl, RecordData::A(Ipv4Addr::from(ip))));
        self
    }

    pub fn cname(mut self, name: &str, target: &str, ttl: u32) -> Self {
        self.records
            .push(ResourceRecord::new(name, ttl, RecordData::Cname(target.into())));
        self
    }

    pub fn build(self) -> Answer {
        Answer::new(self.rcode, self.records)
    }
}

pub const BASE_CONFIG: &str = r#"{
    "BindAddress": ":5353",
    "PrimaryDNS": [{"Name": "Local", "Address": "114.114.114.114:53", "Protocol": "udp", "SOCKS5Address": "", "Timeout": 6}],
    "AlternativeDNS": [{"Name": "Trusted", "Address": "8.8.8.8:53", "Protocol": "tcp", "SOCKS5Address": "", "Timeout": 6}],
    "OnlyPrimaryDNS": false,
    "RedirectIPv6Record": false,
    "IPNetworkFile": "./ip_network_primary_sample",
    "DomainFile": "./domain_alternative_sample",
    "DomainBase64Decode": false,
    "HostsFile": "./hosts_sample",
    "MinimumTTL": 0,
    "CacheSize": 0,
    "RejectQtype": [255]
}"#;
