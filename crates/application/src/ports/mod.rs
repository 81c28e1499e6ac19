mod answer_cache;
mod hosts_resolver;
mod upstream_client;

pub use answer_cache::{AnswerCache, CachedAnswer};
pub use hosts_resolver::HostsResolver;
pub use upstream_client::UpstreamClient;

// Re-export for convenience
pub use ferrous_split_domain::{Answer, DnsQuery, Upstream};
