//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing), one datagram each way on a fresh
//! ephemeral socket. If the response has the TC bit set the caller retries
//! over TCP.

use super::{resolve_addr, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_split_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server: Arc<str>,
}

impl UdpTransport {
    pub fn new(server: Arc<str>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server_addr = resolve_addr(&self.server).await?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::transport(&self.server, format!("failed to bind UDP socket: {}", e))
        })?;

        // A connected socket drops datagrams from any other source.
        socket.connect(server_addr).await.map_err(|e| {
            DomainError::transport(&self.server, format!("failed to connect UDP socket: {}", e))
        })?;

        let bytes_sent = tokio::time::timeout(timeout, socket.send(message_bytes))
            .await
            .map_err(|_| DomainError::timeout(&self.server))?
            .map_err(|e| {
                DomainError::transport(&self.server, format!("failed to send UDP query: {}", e))
            })?;

        debug!(server = %self.server, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let bytes_received = tokio::time::timeout(timeout, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| DomainError::timeout(&self.server))?
            .map_err(|e| {
                DomainError::transport(
                    &self.server,
                    format!("failed to receive UDP response: {}", e),
                )
            })?;

        recv_buf.truncate(bytes_received);

        debug!(server = %self.server, bytes_received, "UDP response received");

        Ok(TransportResponse { bytes: recv_buf })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
