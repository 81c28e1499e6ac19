#![allow(dead_code)]
use async_trait::async_trait;
use ferrous_split_application::ports::UpstreamClient;
use ferrous_split_domain::{
    Answer, DnsQuery, DomainError, ResourceRecord, ResponseCode, Upstream, UpstreamProtocol,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct UpstreamBuilder;

impl UpstreamBuilder {
    pub fn udp(addr: SocketAddr) -> Upstream {
        Upstream::new("mock", &addr.to_string(), UpstreamProtocol::Udp, Duration::from_secs(2))
    }

    pub fn tcp(addr: SocketAddr) -> Upstream {
        Upstream::new("mock", &addr.to_string(), UpstreamProtocol::Tcp, Duration::from_secs(2))
    }
}

/// Upstream client that answers every query with the same addresses.
pub struct FixedUpstreamClient {
    addresses: Vec<Ipv4Addr>,
    calls: AtomicUsize,
}

impl FixedUpstreamClient {
    pub fn new(addresses: Vec<Ipv4Addr>) -> Self {
        Self {
            addresses,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for FixedUpstreamClient {
    async fn exchange(&self, query: &DnsQuery, _upstream: &Upstream) -> Result<Answer, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let records = self
            .addresses
            .iter()
            .map(|ip| ResourceRecord::address(query.name.clone(), 60, IpAddr::V4(*ip)))
            .collect();
        Ok(Answer::new(ResponseCode::NoError, records))
    }
}
