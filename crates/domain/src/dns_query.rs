use crate::dns_record::RecordType;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DnsClass {
    #[default]
    IN,
    CH,
    HS,
    Other(u16),
}

impl DnsClass {
    pub fn to_u16(&self) -> u16 {
        match self {
            DnsClass::IN => 1,
            DnsClass::CH => 3,
            DnsClass::HS => 4,
            DnsClass::Other(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => DnsClass::IN,
            3 => DnsClass::CH,
            4 => DnsClass::HS,
            other => DnsClass::Other(other),
        }
    }
}

/// A question as seen by the dispatcher. The name is stored lowercase and
/// dot-terminated so equal names compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuery {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub class: DnsClass,
}

impl DnsQuery {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: Arc::from(canonical_name(name)),
            record_type,
            class: DnsClass::IN,
        }
    }

    pub fn with_class(mut self, class: DnsClass) -> Self {
        self.class = class;
        self
    }

    /// Same name and class, different type.
    pub fn retyped(&self, record_type: RecordType) -> Self {
        Self {
            name: Arc::clone(&self.name),
            record_type,
            class: self.class,
        }
    }
}

impl fmt::Display for DnsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)
    }
}

pub fn canonical_name(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('.');
    let mut canonical = trimmed.to_ascii_lowercase();
    canonical.push('.');
    canonical
}
