pub mod socks5;
pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use ferrous_split_domain::{DomainError, Upstream, UpstreamProtocol};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub use tcp::{TcpConnectionPool, TcpTransport};
pub use udp::UdpTransport;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum Transport {
    Udp(UdpTransport),
    Tcp(TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(t) => t.protocol_name(),
            Self::Tcp(t) => t.protocol_name(),
        }
    }

    pub fn is_udp(&self) -> bool {
        matches!(self, Self::Udp(_))
    }
}

/// Picks the transport for an upstream. A SOCKS5 proxy only carries TCP, so
/// proxied UDP upstreams are spoken to with TCP framing through the tunnel.
pub fn create_transport(upstream: &Upstream, pool: &Arc<TcpConnectionPool>) -> Transport {
    match (upstream.protocol, &upstream.socks5_address) {
        (UpstreamProtocol::Udp, None) => {
            Transport::Udp(UdpTransport::new(Arc::clone(&upstream.address)))
        }
        (_, proxy) => Transport::Tcp(TcpTransport::new(
            Arc::clone(&upstream.address),
            proxy.clone(),
            Arc::clone(pool),
        )),
    }
}

/// TCP transport to the same endpoint, used to retry a truncated UDP answer.
pub fn tcp_fallback(upstream: &Upstream, pool: &Arc<TcpConnectionPool>) -> Transport {
    Transport::Tcp(TcpTransport::new(
        Arc::clone(&upstream.address),
        upstream.socks5_address.clone(),
        Arc::clone(pool),
    ))
}

/// Resolves `host:port`, preferring a literal socket address.
pub(crate) async fn resolve_addr(address: &str) -> Result<SocketAddr, DomainError> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    tokio::net::lookup_host(address)
        .await
        .map_err(|e| DomainError::transport(address, format!("cannot resolve: {}", e)))?
        .next()
        .ok_or_else(|| DomainError::transport(address, "resolved to no addresses"))
}
