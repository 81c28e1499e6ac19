//! Pure decision rules for choosing between primary and alternative answers.

use super::matcher::Matcher;
use ferrous_split_domain::{Answer, ResponseCode};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntrustedReason {
    Failed,
    Rcode(ResponseCode),
    OutsideNetworks,
}

impl fmt::Display for UntrustedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => f.write_str("primary failed"),
            Self::Rcode(rcode) => write!(f, "primary returned {}", rcode),
            Self::OutsideNetworks => f.write_str("no primary address inside the network list"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryVerdict {
    Trusted,
    Untrusted(UntrustedReason),
}

impl PrimaryVerdict {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted)
    }
}

/// Judges a primary answer (`None` when the primary set failed).
///
/// Trusted iff the rcode is NOERROR and either the network list is empty or
/// at least one A record falls inside it. AAAA records are not consulted.
pub fn primary_verdict(primary: Option<&Answer>, matcher: &Matcher) -> PrimaryVerdict {
    let Some(answer) = primary else {
        return PrimaryVerdict::Untrusted(UntrustedReason::Failed);
    };

    if answer.rcode != ResponseCode::NoError {
        return PrimaryVerdict::Untrusted(UntrustedReason::Rcode(answer.rcode));
    }

    if matcher.network_count() == 0 {
        return PrimaryVerdict::Trusted;
    }

    if answer
        .ipv4_addresses()
        .any(|ip| matcher.matches_network(IpAddr::V4(ip)))
    {
        PrimaryVerdict::Trusted
    } else {
        PrimaryVerdict::Untrusted(UntrustedReason::OutsideNetworks)
    }
}

/// How long an upstream answer may be cached, if at all.
///
/// Only NOERROR answers qualify. The lifetime is the smallest record TTL, so
/// a single zero-TTL record keeps the whole answer out of the cache.
pub fn cache_lifetime(answer: &Answer) -> Option<Duration> {
    if answer.rcode != ResponseCode::NoError {
        return None;
    }
    answer
        .min_ttl()
        .filter(|ttl| *ttl > 0)
        .map(|ttl| Duration::from_secs(u64::from(ttl)))
}
