use crate::dns::forwarding::{MessageBuilder, RecordTypeMapper};
use crate::dns::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use arc_swap::ArcSwap;
use ferrous_split_application::use_cases::HandleDnsQueryUseCase;
use ferrous_split_domain::{Answer, DnsQuery, ResponseCode};
use hickory_proto::op::{Message, MessageType, OpCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, info, warn};

const DNS_HEADER_LEN: usize = 12;
const MAX_UDP_REQUEST_SIZE: usize = 4096;
/// TCP clients that stay silent this long are disconnected.
pub const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Replies are bounded by the client's advertised payload size.
    Udp,
    Tcp,
}

/// Turns raw request bytes into raw reply bytes. The use case behind it can
/// be swapped at runtime (configuration reload) without dropping listeners.
pub struct DnsServerHandler {
    use_case: ArcSwap<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self {
            use_case: ArcSwap::new(use_case),
        }
    }

    pub fn replace(&self, use_case: Arc<HandleDnsQueryUseCase>) {
        self.use_case.store(use_case);
    }

    pub fn use_case(&self) -> Arc<HandleDnsQueryUseCase> {
        self.use_case.load_full()
    }

    /// `None` means the request is dropped without a reply: it is too short
    /// to carry an ID, or it is itself a response.
    pub async fn handle(&self, request: &[u8], client: SocketAddr, framing: Framing) -> Option<Vec<u8>> {
        if request.len() < DNS_HEADER_LEN {
            debug!(client = %client, len = request.len(), "Dropping runt request");
            return None;
        }

        let message = match Message::from_vec(request) {
            Ok(message) => message,
            Err(e) => {
                debug!(client = %client, error = %e, "Undecodable request");
                return Some(header_only_response(request, ResponseCode::FormErr));
            }
        };

        if message.message_type() != MessageType::Query {
            debug!(client = %client, "Dropping response sent to listener");
            return None;
        }

        if message.op_code() != OpCode::Query {
            debug!(client = %client, op_code = ?message.op_code(), "Unsupported opcode");
            return Some(encode_reply(
                request,
                &message,
                &Answer::new(ResponseCode::NotImp, Vec::new()),
                framing,
            ));
        }

        let Some(question) = message.queries().first() else {
            debug!(client = %client, "Request without a question");
            return Some(encode_reply(
                request,
                &message,
                &Answer::new(ResponseCode::FormErr, Vec::new()),
                framing,
            ));
        };

        let query = DnsQuery::new(
            &question.name().to_ascii(),
            RecordTypeMapper::from_hickory(question.query_type()),
        )
        .with_class(RecordTypeMapper::class_from_hickory(question.query_class()));

        debug!(client = %client, query = %query, "DNS query received");

        let answer = self.use_case.load_full().execute(&query).await;

        Some(encode_reply(request, &message, &answer, framing))
    }
}

fn encode_reply(raw_request: &[u8], request: &Message, answer: &Answer, framing: Framing) -> Vec<u8> {
    let encoded = MessageBuilder::build_response(request, answer)
        .and_then(|response| MessageBuilder::serialize_message(&response));

    let bytes = match encoded {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to encode reply");
            return header_only_response(raw_request, ResponseCode::ServFail);
        }
    };

    let limit = usize::from(request.max_payload());
    if framing == Framing::Tcp || bytes.len() <= limit {
        return bytes;
    }

    debug!(size = bytes.len(), limit, "Reply exceeds UDP payload size, truncating");

    let mut truncated = Answer::new(answer.rcode, Vec::new());
    truncated.truncated = true;
    MessageBuilder::build_response(request, &truncated)
        .and_then(|response| MessageBuilder::serialize_message(&response))
        .unwrap_or_else(|_| header_only_response(raw_request, ResponseCode::ServFail))
}

/// Bare header reply for requests that cannot be decoded or re-encoded.
/// Keeps the ID, opcode and RD bit of the request.
pub fn header_only_response(request: &[u8], rcode: ResponseCode) -> Vec<u8> {
    let mut header = vec![0u8; DNS_HEADER_LEN];
    header[0] = request.first().copied().unwrap_or(0);
    header[1] = request.get(1).copied().unwrap_or(0);
    header[2] = 0x80 | (request.get(2).copied().unwrap_or(0) & 0x79);
    header[3] = 0x80 | (rcode.to_u16() & 0x0F) as u8;
    header
}

/// Serves DNS over UDP until the task is dropped. Each datagram is handled
/// on its own task.
pub async fn serve_udp(socket: Arc<UdpSocket>, handler: Arc<DnsServerHandler>) {
    if let Ok(addr) = socket.local_addr() {
        info!(bind_address = %addr, "UDP listener ready");
    }

    let mut buf = vec![0u8; MAX_UDP_REQUEST_SIZE];
    loop {
        let (len, client) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "UDP receive failed");
                continue;
            }
        };

        let request = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let handler = Arc::clone(&handler);

        tokio::spawn(async move {
            if let Some(reply) = handler.handle(&request, client, Framing::Udp).await {
                if let Err(e) = socket.send_to(&reply, client).await {
                    debug!(client = %client, error = %e, "Failed to send UDP reply");
                }
            }
        });
    }
}

/// Serves DNS over TCP until the task is dropped. A connection may carry
/// several length-prefixed queries and is closed after `TCP_IDLE_TIMEOUT`
/// without one.
pub async fn serve_tcp(listener: TcpListener, handler: Arc<DnsServerHandler>) {
    if let Ok(addr) = listener.local_addr() {
        info!(bind_address = %addr, "TCP listener ready");
    }

    loop {
        let (stream, client) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "TCP accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            serve_tcp_connection(stream, client, handler).await;
        });
    }
}

async fn serve_tcp_connection(mut stream: TcpStream, client: SocketAddr, handler: Arc<DnsServerHandler>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(client = %client, error = %e, "Failed to set TCP_NODELAY");
    }

    loop {
        let request = match tokio::time::timeout(TCP_IDLE_TIMEOUT, read_with_length_prefix(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                debug!(client = %client, reason = %e, "TCP connection closed");
                return;
            }
            Err(_) => {
                debug!(client = %client, "TCP connection idle, closing");
                return;
            }
        };

        let Some(reply) = handler.handle(&request, client, Framing::Tcp).await else {
            continue;
        };

        if let Err(e) = send_with_length_prefix(&mut stream, &reply).await {
            debug!(client = %client, error = %e, "Failed to send TCP reply");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_response_keeps_id_opcode_and_rd() {
        // ID 0xBEEF, opcode STATUS (2), RD set, plus bits that must not leak.
        let request = [0xBE, 0xEF, 0x13 | 0x06, 0xFF, 0, 1, 0, 0, 0, 0, 0, 0];
        let reply = header_only_response(&request, ResponseCode::FormErr);

        assert_eq!(reply.len(), DNS_HEADER_LEN);
        assert_eq!(&reply[..2], &[0xBE, 0xEF]);
        assert_eq!(reply[2], 0x80 | 0x10 | 0x01);
        assert_eq!(reply[3], 0x81);
        assert!(reply[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_header_only_servfail() {
        let request = [0x00, 0x01, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        let reply = header_only_response(&request, ResponseCode::ServFail);

        assert_eq!(&reply[..4], &[0x00, 0x01, 0x81, 0x82]);
    }
}
