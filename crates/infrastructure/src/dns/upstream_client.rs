use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use crate::dns::transport::{self, TcpConnectionPool};
use async_trait::async_trait;
use ferrous_split_application::ports::UpstreamClient;
use ferrous_split_domain::{Answer, DnsQuery, DomainError, Upstream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upstream client speaking plain DNS over UDP, TCP, or TCP through a SOCKS5
/// proxy.
///
/// Flow: build message → send via transport → check ID → parse. A truncated
/// UDP response is retried once over TCP within what is left of the
/// endpoint's timeout.
pub struct ForwardingUpstreamClient {
    pool: Arc<TcpConnectionPool>,
}

impl ForwardingUpstreamClient {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(TcpConnectionPool::new()),
        }
    }

    pub fn pool(&self) -> &Arc<TcpConnectionPool> {
        &self.pool
    }

    async fn send_and_parse(
        &self,
        transport: &transport::Transport,
        upstream: &Upstream,
        query_id: u16,
        query_bytes: &[u8],
        timeout: Duration,
    ) -> Result<(bool, Answer), DomainError> {
        let response = transport.send(query_bytes, timeout).await?;
        let parsed = ResponseParser::parse(&response.bytes, &upstream.address)?;

        if parsed.id != query_id {
            return Err(DomainError::malformed(
                &upstream.address,
                format!("response ID {} does not match query ID {}", parsed.id, query_id),
            ));
        }

        Ok((parsed.truncated, parsed.answer))
    }
}

impl Default for ForwardingUpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamClient for ForwardingUpstreamClient {
    async fn exchange(&self, query: &DnsQuery, upstream: &Upstream) -> Result<Answer, DomainError> {
        let start = Instant::now();
        let (query_id, query_bytes) = MessageBuilder::build_query(query)?;

        let dns_transport = transport::create_transport(upstream, &self.pool);
        let (truncated, answer) = self
            .send_and_parse(&dns_transport, upstream, query_id, &query_bytes, upstream.timeout)
            .await?;

        if !(truncated && dns_transport.is_udp()) {
            debug!(
                upstream = %upstream.name,
                protocol = dns_transport.protocol_name(),
                rcode = %answer.rcode,
                latency_ms = start.elapsed().as_millis() as u64,
                "Upstream exchange complete"
            );
            return Ok(answer);
        }

        debug!(upstream = %upstream.name, "Response truncated (TC bit), retrying via TCP");

        let remaining = upstream
            .timeout
            .checked_sub(start.elapsed())
            .filter(|d| !d.is_zero())
            .ok_or_else(|| DomainError::timeout(&upstream.address))?;

        let tcp_transport = transport::tcp_fallback(upstream, &self.pool);
        let (_, answer) = self
            .send_and_parse(&tcp_transport, upstream, query_id, &query_bytes, remaining)
            .await?;

        debug!(
            upstream = %upstream.name,
            protocol = tcp_transport.protocol_name(),
            rcode = %answer.rcode,
            latency_ms = start.elapsed().as_millis() as u64,
            "Upstream exchange complete after TCP retry"
        );

        Ok(answer)
    }
}
