use ferrous_split_application::ports::{AnswerCache, CachedAnswer};
use ferrous_split_domain::{Answer, DnsQuery, DomainError};
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    answer: Answer,
    expires_at: Instant,
}

/// Bounded LRU answer cache. Entries expire after the lifetime given at
/// insertion and are evicted lazily on lookup.
pub struct LruAnswerCache {
    entries: Mutex<LruCache<DnsQuery, Entry, FxBuildHasher>>,
}

impl LruAnswerCache {
    /// `None` when `capacity` is zero, which disables caching.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.cap().get())
            .unwrap_or(0)
    }
}

impl AnswerCache for LruAnswerCache {
    fn get(&self, query: &DnsQuery) -> Result<Option<CachedAnswer>, DomainError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DomainError::CacheUnavailable(e.to_string()))?;

        let now = Instant::now();
        let hit = match entries.get(query) {
            Some(entry) if entry.expires_at > now => Some(CachedAnswer {
                answer: entry.answer.clone(),
                remaining: entry.expires_at - now,
            }),
            Some(_) => None,
            None => return Ok(None),
        };

        if hit.is_none() {
            entries.pop(query);
            debug!(query = %query, "Cache entry expired");
        }

        Ok(hit)
    }

    fn put(&self, query: &DnsQuery, answer: Answer, lifetime: Duration) -> Result<(), DomainError> {
        if lifetime.is_zero() {
            return Ok(());
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DomainError::CacheUnavailable(e.to_string()))?;

        entries.put(
            query.clone(),
            Entry {
                answer,
                expires_at: Instant::now() + lifetime,
            },
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
