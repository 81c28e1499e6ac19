//! SOCKS5 CONNECT (RFC 1928) with the no-authentication method only.

use ferrous_split_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Opens a tunnel to `target` (`host:port`) through the proxy at `proxy`.
/// The whole handshake is bounded by `timeout`.
pub async fn connect(proxy: &str, target: &str, timeout: Duration) -> Result<TcpStream, DomainError> {
    let request = connect_request(target).map_err(|e| DomainError::transport(target, e))?;

    tokio::time::timeout(timeout, async {
        let mut stream = TcpStream::connect(proxy).await.map_err(|e| {
            DomainError::transport(target, format!("SOCKS5 proxy {} unreachable: {}", proxy, e))
        })?;

        handshake(&mut stream, &request)
            .await
            .map_err(|e| DomainError::transport(target, format!("SOCKS5 via {}: {}", proxy, e)))?;

        debug!(proxy = %proxy, target = %target, "SOCKS5 tunnel established");
        Ok(stream)
    })
    .await
    .map_err(|_| DomainError::timeout(target))?
}

async fn handshake<S>(stream: &mut S, connect_request: &[u8]) -> Result<(), String>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    stream
        .write_all(&[VERSION, 0x01, METHOD_NO_AUTH])
        .await
        .map_err(|e| format!("failed to send greeting: {}", e))?;

    let mut method = [0u8; 2];
    stream
        .read_exact(&mut method)
        .await
        .map_err(|e| format!("failed to read method selection: {}", e))?;
    if method[0] != VERSION {
        return Err(format!("invalid version {} in method selection", method[0]));
    }
    if method[1] != METHOD_NO_AUTH {
        return Err(format!("proxy requires unsupported auth method {:#04x}", method[1]));
    }

    stream
        .write_all(connect_request)
        .await
        .map_err(|e| format!("failed to send CONNECT: {}", e))?;

    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .await
        .map_err(|e| format!("failed to read CONNECT reply: {}", e))?;
    if header[0] != VERSION {
        return Err(format!("invalid version {} in CONNECT reply", header[0]));
    }
    if header[1] != 0x00 {
        return Err(format!("CONNECT failed: {}", reply_message(header[1])));
    }

    // Bound address and port are not needed.
    let skip = match header[3] {
        ATYP_IPV4 => 4 + 2,
        ATYP_IPV6 => 16 + 2,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream
                .read_exact(&mut len)
                .await
                .map_err(|e| format!("failed to read bound address: {}", e))?;
            usize::from(len[0]) + 2
        }
        other => return Err(format!("unsupported address type {:#04x} in reply", other)),
    };
    let mut bound = vec![0u8; skip];
    stream
        .read_exact(&mut bound)
        .await
        .map_err(|e| format!("failed to read bound address: {}", e))?;

    Ok(())
}

/// CONNECT request for `host:port`; hostnames are left for the proxy to
/// resolve.
pub(crate) fn connect_request(target: &str) -> Result<Vec<u8>, String> {
    let mut request = vec![VERSION, CMD_CONNECT, 0x00];

    if let Ok(addr) = target.parse::<SocketAddr>() {
        match addr.ip() {
            IpAddr::V4(v4) => {
                request.push(ATYP_IPV4);
                request.extend_from_slice(&v4.octets());
            }
            IpAddr::V6(v6) => {
                request.push(ATYP_IPV6);
                request.extend_from_slice(&v6.octets());
            }
        }
        request.extend_from_slice(&addr.port().to_be_bytes());
        return Ok(request);
    }

    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is not host:port", target))?;
    let port: u16 = port
        .parse()
        .map_err(|_| format!("'{}' has an invalid port", target))?;
    let host_len = u8::try_from(host.len()).map_err(|_| format!("host '{}' too long", host))?;
    if host_len == 0 {
        return Err(format!("'{}' has an empty host", target));
    }

    request.push(ATYP_DOMAIN);
    request.push(host_len);
    request.extend_from_slice(host.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    Ok(request)
}

fn reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown error",
    }
}
