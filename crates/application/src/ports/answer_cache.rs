use ferrous_split_domain::{Answer, DnsQuery, DomainError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub answer: Answer,
    /// Time left before the entry expires.
    pub remaining: Duration,
}

/// Answer cache keyed by (name, type). Expired entries are never returned.
pub trait AnswerCache: Send + Sync {
    fn get(&self, query: &DnsQuery) -> Result<Option<CachedAnswer>, DomainError>;

    fn put(&self, query: &DnsQuery, answer: Answer, lifetime: Duration) -> Result<(), DomainError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
