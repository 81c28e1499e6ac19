use ferrous_split_application::ports::HostsResolver;
use ferrous_split_domain::HostsTable;
use std::net::IpAddr;

/// Hosts-file resolver over a table loaded at startup. Reload builds a new
/// resolver along with the rest of the stack.
pub struct HostsFileResolver {
    table: HostsTable,
}

impl HostsFileResolver {
    pub fn new(table: HostsTable) -> Self {
        Self { table }
    }
}

impl HostsResolver for HostsFileResolver {
    fn lookup(&self, name: &str) -> Option<Vec<IpAddr>> {
        self.table.lookup(name).map(<[IpAddr]>::to_vec)
    }
}
