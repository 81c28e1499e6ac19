pub mod cache;
pub mod forwarding;
pub mod hosts;
pub mod server;
pub mod transport;
pub mod upstream_client;

pub use cache::LruAnswerCache;
pub use hosts::HostsFileResolver;
pub use server::{serve_tcp, serve_udp, DnsServerHandler, Framing};
pub use upstream_client::ForwardingUpstreamClient;
