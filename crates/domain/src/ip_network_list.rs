use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Ordered CIDR ranges whose addresses are considered trustworthy when they
/// come back from the primary upstreams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpNetworkList {
    networks: Vec<IpNetwork>,
}

impl IpNetworkList {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self { networks }
    }

    /// One CIDR per line. Blank lines are skipped; the first line that is not
    /// a CIDR ends the list.
    pub fn parse(text: &str) -> Self {
        let mut networks = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_cidr(line) {
                Some(network) => networks.push(network),
                None => break,
            }
        }
        Self { networks }
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|network| match (network, ip) {
            (IpNetwork::V4(net), IpAddr::V4(v4)) => net.contains(v4),
            (IpNetwork::V6(net), IpAddr::V6(v6)) => net.contains(v6),
            _ => false,
        })
    }

    pub fn networks(&self) -> &[IpNetwork] {
        &self.networks
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

fn parse_cidr(line: &str) -> Option<IpNetwork> {
    if !line.contains('/') {
        return None;
    }
    line.parse::<IpNetwork>().ok()
}
