use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpstreamProtocol {
    #[default]
    Udp,
    Tcp,
}

impl UpstreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Some(Self::Udp),
            "tcp" => Some(Self::Tcp),
            _ => None,
        }
    }
}

impl fmt::Display for UpstreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream resolver endpoint, immutable after configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub name: Arc<str>,

    /// `host:port`
    pub address: Arc<str>,

    pub protocol: UpstreamProtocol,

    /// When set, every exchange is tunnelled through this SOCKS5 proxy.
    pub socks5_address: Option<Arc<str>>,

    pub timeout: Duration,
}

impl Upstream {
    pub fn new(name: &str, address: &str, protocol: UpstreamProtocol, timeout: Duration) -> Self {
        Self {
            name: Arc::from(name),
            address: Arc::from(address),
            protocol,
            socks5_address: None,
            timeout,
        }
    }

    pub fn with_socks5(mut self, proxy: &str) -> Self {
        self.socks5_address = Some(Arc::from(proxy));
        self
    }

    pub fn uses_proxy(&self) -> bool {
        self.socks5_address.is_some()
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}://{})", self.name, self.protocol, self.address)?;
        if let Some(proxy) = &self.socks5_address {
            write!(f, " via socks5://{}", proxy)?;
        }
        Ok(())
    }
}
