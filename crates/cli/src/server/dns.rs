use ferrous_split_infrastructure::dns::{serve_tcp, serve_udp, DnsServerHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tracing::info;

pub struct DnsListeners {
    udp: Arc<UdpSocket>,
    tcp: TcpListener,
}

/// Binds UDP and TCP on the same address. Failure here is fatal.
pub async fn bind_dns_listeners(bind_addr: SocketAddr) -> anyhow::Result<DnsListeners> {
    let udp = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind UDP {}: {}", bind_addr, e))?;
    let tcp = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind TCP {}: {}", bind_addr, e))?;

    info!(bind_address = %bind_addr, "Starting DNS server");

    Ok(DnsListeners {
        udp: Arc::new(udp),
        tcp,
    })
}

pub async fn run_dns_server(listeners: DnsListeners, handler: Arc<DnsServerHandler>) {
    let mut join_set: JoinSet<()> = JoinSet::new();

    join_set.spawn(serve_udp(listeners.udp, Arc::clone(&handler)));
    join_set.spawn(serve_tcp(listeners.tcp, handler));

    while join_set.join_next().await.is_some() {}
}
