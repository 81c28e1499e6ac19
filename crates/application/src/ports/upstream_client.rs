use async_trait::async_trait;
use ferrous_split_domain::{Answer, DnsQuery, DomainError, Upstream};

/// One request/response exchange with a single upstream endpoint.
///
/// Implementations must be safe to call concurrently and must classify
/// failures as `UpstreamTimeout`, `UpstreamTransport` or `MalformedResponse`.
/// Callers bound each exchange with `upstream.timeout` themselves.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn exchange(&self, query: &DnsQuery, upstream: &Upstream)
        -> Result<Answer, DomainError>;
}
