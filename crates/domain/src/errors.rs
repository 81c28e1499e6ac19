use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Upstream timeout waiting for {server}")]
    UpstreamTimeout { server: String },

    #[error("Upstream transport failure with {server}: {reason}")]
    UpstreamTransport { server: String, reason: String },

    #[error("Malformed response from {server}: {reason}")]
    MalformedResponse { server: String, reason: String },

    #[error("No upstream servers configured")]
    NoUpstreams,

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl DomainError {
    pub fn transport(server: impl ToString, reason: impl ToString) -> Self {
        Self::UpstreamTransport {
            server: server.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(server: impl ToString, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            server: server.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(server: impl ToString) -> Self {
        Self::UpstreamTimeout {
            server: server.to_string(),
        }
    }
}

/// Failure to load one of the optional list files (domain list, IP network
/// list, hosts). Never fatal: the caller disables the feature instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceLoadError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}
