use crate::dns_query::canonical_name;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Static name to address overrides, parsed from a hosts(5) style file.
#[derive(Debug, Clone, Default)]
pub struct HostsTable {
    entries: HashMap<Arc<str>, Vec<IpAddr>>,
}

impl HostsTable {
    pub fn parse(text: &str) -> Self {
        let mut entries: HashMap<Arc<str>, Vec<IpAddr>> = HashMap::new();

        for line in text.lines() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let mut fields = line.split_whitespace();
            let Some(ip_field) = fields.next() else {
                continue;
            };
            // Zone ids (fe80::1%eth0) are not meaningful in an answer.
            let ip_field = ip_field.split('%').next().unwrap_or(ip_field);
            let Ok(ip) = ip_field.parse::<IpAddr>() else {
                continue;
            };

            for name in fields {
                let addresses = entries.entry(Arc::from(canonical_name(name))).or_default();
                if !addresses.contains(&ip) {
                    addresses.push(ip);
                }
            }
        }

        Self { entries }
    }

    pub fn insert(&mut self, name: &str, ip: IpAddr) {
        let addresses = self
            .entries
            .entry(Arc::from(canonical_name(name)))
            .or_default();
        if !addresses.contains(&ip) {
            addresses.push(ip);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&[IpAddr]> {
        let key = canonical_name(name);
        self.entries.get(key.as_str()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
