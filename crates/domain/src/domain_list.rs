use crate::dns_query::canonical_name;
use std::sync::Arc;

/// Domain patterns routed to the alternative upstreams. Each pattern matches
/// itself and every label-aligned subdomain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainList {
    patterns: Vec<Arc<str>>,
}

impl DomainList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<Arc<str>> = patterns
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim().trim_start_matches("*.").trim_start_matches('.');
                if p.is_empty() || p == "." {
                    None
                } else {
                    Some(Arc::from(canonical_name(p)))
                }
            })
            .collect();
        normalized.sort();
        normalized.dedup();
        Self {
            patterns: normalized,
        }
    }

    pub fn patterns(&self) -> &[Arc<str>] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
