use crate::dns_record::{RecordData, ResourceRecord};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u16),
}

impl ResponseCode {
    pub fn to_u16(&self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::Other(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unit exchanged between upstream clients and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub rcode: ResponseCode,
    pub records: Vec<ResourceRecord>,
    pub truncated: bool,
}

impl Answer {
    pub fn new(rcode: ResponseCode, records: Vec<ResourceRecord>) -> Self {
        Self {
            rcode,
            records,
            truncated: false,
        }
    }

    pub fn servfail() -> Self {
        Self::new(ResponseCode::ServFail, vec![])
    }

    pub fn refused() -> Self {
        Self::new(ResponseCode::Refused, vec![])
    }

    pub fn is_success(&self) -> bool {
        self.rcode == ResponseCode::NoError
    }

    pub fn ipv4_addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.records.iter().filter_map(|r| match r.data {
            RecordData::A(v4) => Some(v4),
            _ => None,
        })
    }

    pub fn min_ttl(&self) -> Option<u32> {
        self.records.iter().map(|r| r.ttl).min()
    }

    /// Raises every record TTL to at least `floor`. Never lowers one.
    pub fn with_ttl_floor(mut self, floor: u32) -> Self {
        for record in &mut self.records {
            record.ttl = record.ttl.max(floor);
        }
        self
    }

    /// Lowers every record TTL to at most `ceiling`.
    pub fn with_ttl_ceiling(mut self, ceiling: u32) -> Self {
        for record in &mut self.records {
            record.ttl = record.ttl.min(ceiling);
        }
        self
    }
}
