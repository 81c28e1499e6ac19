use std::net::IpAddr;

/// Static name overrides consulted before any cache or upstream.
pub trait HostsResolver: Send + Sync {
    /// `None` when the name has no entry; an entry may hold zero addresses.
    fn lookup(&self, name: &str) -> Option<Vec<IpAddr>>;
}
