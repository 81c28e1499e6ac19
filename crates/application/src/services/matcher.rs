use super::suffix_trie::SuffixTrie;
use ferrous_split_domain::{DomainList, IpNetworkList};
use std::net::IpAddr;

/// Compiled domain and network lists. Built once, then only read, so it is
/// shared behind an `Arc` without locking.
#[derive(Default)]
pub struct Matcher {
    domains: SuffixTrie,
    networks: IpNetworkList,
}

impl Matcher {
    pub fn new(domains: &DomainList, networks: IpNetworkList) -> Self {
        let mut trie = SuffixTrie::new();
        for pattern in domains.patterns() {
            trie.insert(pattern);
        }
        Self {
            domains: trie,
            networks,
        }
    }

    pub fn matches_domain(&self, name: &str) -> bool {
        self.domains.matches(name)
    }

    pub fn matches_network(&self, ip: IpAddr) -> bool {
        self.networks.contains(ip)
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }
}
