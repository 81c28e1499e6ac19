pub mod dns;

pub use dns::{bind_dns_listeners, run_dns_server};
