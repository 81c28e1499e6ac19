//! TCP transport (RFC 1035 §4.2.2): two-byte length prefix, idle connections
//! kept per endpoint for reuse.

use super::{socks5, DnsTransport, TransportResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use ferrous_split_domain::DomainError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;
const MAX_IDLE_TCP_PER_HOST: usize = 2;

/// Idle upstream connections, keyed by endpoint (and proxy, when tunnelled).
#[derive(Default)]
pub struct TcpConnectionPool {
    idle: DashMap<String, Vec<TcpStream>>,
}

impl TcpConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn take(&self, key: &str) -> Option<TcpStream> {
        self.idle.get_mut(key)?.pop()
    }

    fn put(&self, key: String, stream: TcpStream) {
        let mut entry = self.idle.entry(key).or_default();
        if entry.len() < MAX_IDLE_TCP_PER_HOST {
            entry.push(stream);
        }
    }

    pub fn idle_count(&self, key: &str) -> usize {
        self.idle.get(key).map_or(0, |e| e.len())
    }
}

pub struct TcpTransport {
    server: Arc<str>,
    proxy: Option<Arc<str>>,
    pool: Arc<TcpConnectionPool>,
}

impl TcpTransport {
    pub fn new(server: Arc<str>, proxy: Option<Arc<str>>, pool: Arc<TcpConnectionPool>) -> Self {
        Self {
            server,
            proxy,
            pool,
        }
    }

    pub fn pool_key(&self) -> String {
        match &self.proxy {
            Some(proxy) => format!("socks5://{}/{}", proxy, self.server),
            None => self.server.to_string(),
        }
    }

    async fn connect_new(&self, timeout: Duration) -> Result<TcpStream, DomainError> {
        let stream = match &self.proxy {
            Some(proxy) => socks5::connect(proxy, &self.server, timeout).await?,
            None => tokio::time::timeout(timeout, TcpStream::connect(&*self.server))
                .await
                .map_err(|_| DomainError::timeout(&self.server))?
                .map_err(|e| {
                    DomainError::transport(&self.server, format!("connect failed: {}", e))
                })?,
        };

        stream.set_nodelay(true).map_err(|e| {
            DomainError::transport(&self.server, format!("failed to set TCP_NODELAY: {}", e))
        })?;

        Ok(stream)
    }

    async fn exchange_on(
        &self,
        stream: &mut TcpStream,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        tokio::time::timeout(timeout, send_with_length_prefix(stream, message_bytes))
            .await
            .map_err(|_| DomainError::timeout(&self.server))?
            .map_err(|e| DomainError::transport(&self.server, e))?;

        debug!(server = %self.server, message_len = message_bytes.len(), "TCP query sent");

        tokio::time::timeout(timeout, read_with_length_prefix(stream))
            .await
            .map_err(|_| DomainError::timeout(&self.server))?
            .map_err(|e| DomainError::transport(&self.server, e))
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let key = self.pool_key();

        // A pooled connection may have been closed by the server while idle;
        // any failure on it is retried once on a fresh connection.
        let pooled = self.pool.take(&key);
        let (stream, response_bytes) = match pooled {
            Some(mut stream) => match self.exchange_on(&mut stream, message_bytes, timeout).await {
                Ok(bytes) => (stream, bytes),
                Err(e) => {
                    debug!(server = %self.server, error = %e, "Pooled TCP connection unusable");
                    let mut fresh = self.connect_new(timeout).await?;
                    let bytes = self.exchange_on(&mut fresh, message_bytes, timeout).await?;
                    (fresh, bytes)
                }
            },
            None => {
                let mut fresh = self.connect_new(timeout).await?;
                let bytes = self.exchange_on(&mut fresh, message_bytes, timeout).await?;
                (fresh, bytes)
            }
        };

        debug!(server = %self.server, response_len = response_bytes.len(), "TCP response received");

        self.pool.put(key, stream);

        Ok(TransportResponse {
            bytes: response_bytes,
        })
    }

    fn protocol_name(&self) -> &'static str {
        if self.proxy.is_some() {
            "SOCKS5"
        } else {
            "TCP"
        }
    }
}

pub async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> Result<(), String>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len())
        .map_err(|_| format!("message too large: {} bytes", message_bytes.len()))?;

    let mut frame = Vec::with_capacity(message_bytes.len() + 2);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(message_bytes);

    stream
        .write_all(&frame)
        .await
        .map_err(|e| format!("failed to write DNS message: {}", e))?;
    stream
        .flush()
        .await
        .map_err(|e| format!("failed to flush stream: {}", e))?;

    Ok(())
}

pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, String>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| format!("failed to read message length: {}", e))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    if message_len > MAX_TCP_MESSAGE_SIZE {
        return Err(format!(
            "message too large: {} bytes (max {})",
            message_len, MAX_TCP_MESSAGE_SIZE
        ));
    }

    let mut message = vec![0u8; message_len];
    stream
        .read_exact(&mut message)
        .await
        .map_err(|e| format!("failed to read message body: {}", e))?;

    Ok(message)
}
