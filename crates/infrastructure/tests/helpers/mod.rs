#![allow(dead_code, unused_imports)]
pub mod builders;
pub mod dns_server_mock;
pub mod socks5_mock;

pub use builders::{FixedUpstreamClient, UpstreamBuilder};
pub use dns_server_mock::{MockBehavior, MockDnsServer};
pub use socks5_mock::MockSocks5Proxy;
