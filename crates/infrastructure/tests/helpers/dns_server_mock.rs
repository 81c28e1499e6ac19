#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

/// What the mock answers with. Every question gets the same addresses.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub addresses: Vec<Ipv4Addr>,
    pub ttl: u32,
    /// UDP replies carry TC and no answers; TCP replies are complete.
    pub truncate_udp: bool,
    /// Reply with an ID different from the query's.
    pub wrong_id: bool,
}

impl MockBehavior {
    pub fn answering(addresses: &[[u8; 4]]) -> Self {
        Self {
            addresses: addresses.iter().map(|ip| Ipv4Addr::from(*ip)).collect(),
            ttl: 60,
            truncate_udp: false,
            wrong_id: false,
        }
    }

    pub fn truncating_udp(mut self) -> Self {
        self.truncate_udp = true;
        self
    }

    pub fn with_wrong_id(mut self) -> Self {
        self.wrong_id = true;
        self
    }
}

/// In-process DNS server listening on the same loopback port for UDP and TCP.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    tcp_connections: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> Self {
        let (udp, tcp) = bind_pair().await;
        let addr = udp.local_addr().unwrap();

        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_connections = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let udp_counter = Arc::clone(&udp_queries);
        let tcp_counter = Arc::clone(&tcp_queries);
        let conn_counter = Arc::clone(&tcp_connections);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = udp.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_counter.fetch_add(1, Ordering::SeqCst);
                            if let Some(reply) = build_reply(&buf[..len], &behavior, true) {
                                let _ = udp.send_to(&reply, peer).await;
                            }
                        }
                    }
                    result = tcp.accept() => {
                        if let Ok((stream, _)) = result {
                            conn_counter.fetch_add(1, Ordering::SeqCst);
                            let behavior = behavior.clone();
                            let counter = Arc::clone(&tcp_counter);
                            tokio::spawn(serve_tcp_connection(stream, behavior, counter));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            udp_queries,
            tcp_queries,
            tcp_connections,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_connections(&self) -> usize {
        self.tcp_connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn bind_pair() -> (UdpSocket, TcpListener) {
    for _ in 0..20 {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = udp.local_addr().unwrap().port();
        if let Ok(tcp) = TcpListener::bind(("127.0.0.1", port)).await {
            return (udp, tcp);
        }
    }
    panic!("could not bind UDP and TCP on a shared port");
}

async fn serve_tcp_connection(mut stream: TcpStream, behavior: MockBehavior, counter: Arc<AtomicUsize>) {
    loop {
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let mut request = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        if stream.read_exact(&mut request).await.is_err() {
            return;
        }
        counter.fetch_add(1, Ordering::SeqCst);

        let Some(reply) = build_reply(&request, &behavior, false) else {
            return;
        };
        let mut frame = (reply.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(&reply);
        if stream.write_all(&frame).await.is_err() {
            return;
        }
    }
}

fn build_reply(request: &[u8], behavior: &MockBehavior, over_udp: bool) -> Option<Vec<u8>> {
    let request = Message::from_vec(request).ok()?;

    let mut reply = Message::new();
    let id = if behavior.wrong_id {
        request.id().wrapping_add(1)
    } else {
        request.id()
    };
    reply
        .set_id(id)
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError);
    reply.add_queries(request.queries().iter().cloned());

    if over_udp && behavior.truncate_udp {
        reply.set_truncated(true);
    } else if let Some(question) = request.queries().first() {
        for ip in &behavior.addresses {
            reply.add_answer(Record::from_rdata(
                question.name().clone(),
                behavior.ttl,
                RData::A(A(*ip)),
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut encoder = BinEncoder::new(&mut bytes);
    reply.emit(&mut encoder).ok()?;
    Some(bytes)
}
