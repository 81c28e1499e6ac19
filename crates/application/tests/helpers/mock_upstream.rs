use async_trait::async_trait;
use ferrous_split_application::ports::{AnswerCache, CachedAnswer, HostsResolver, UpstreamClient};
use ferrous_split_domain::dns_query::canonical_name;
use ferrous_split_domain::{
    Answer, DnsQuery, DomainError, RecordData, RecordType, ResourceRecord, ResponseCode, Upstream,
    UpstreamProtocol,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
pub enum Behavior {
    Answer(Answer),
    Fail(DomainError),
    Hang,
}

#[derive(Clone)]
struct Scripted {
    behavior: Behavior,
    delay: Duration,
}

/// Upstream client keyed by endpoint address. Delays use tokio time so tests
/// can run on a paused clock.
#[derive(Default)]
pub struct MockUpstreamClient {
    scripts: RwLock<HashMap<String, Scripted>>,
    calls: Mutex<Vec<(String, DnsQuery)>>,
    completed: Mutex<Vec<String>>,
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, address: &str, answer: Answer, delay: Duration) {
        self.script(address, Behavior::Answer(answer), delay);
    }

    pub fn fail(&self, address: &str, delay: Duration) {
        self.script(
            address,
            Behavior::Fail(DomainError::transport(address, "connection refused")),
            delay,
        );
    }

    pub fn hang(&self, address: &str) {
        self.script(address, Behavior::Hang, Duration::ZERO);
    }

    fn script(&self, address: &str, behavior: Behavior, delay: Duration) {
        self.scripts
            .write()
            .unwrap()
            .insert(address.to_string(), Scripted { behavior, delay });
    }

    pub fn calls_to(&self, address: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == address)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn queries_to(&self, address: &str) -> Vec<DnsQuery> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == address)
            .map(|(_, q)| q.clone())
            .collect()
    }

    /// Exchanges that ran to completion (not aborted).
    pub fn completed_to(&self, address: &str) -> usize {
        self.completed
            .lock()
            .unwrap()
            .iter()
            .filter(|a| *a == address)
            .count()
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn exchange(&self, query: &DnsQuery, upstream: &Upstream) -> Result<Answer, DomainError> {
        let address = upstream.address.to_string();
        self.calls
            .lock()
            .unwrap()
            .push((address.clone(), query.clone()));

        let scripted = self.scripts.read().unwrap().get(&address).cloned();
        let Some(scripted) = scripted else {
            return Err(DomainError::transport(&address, "no script"));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        let result = match scripted.behavior {
            Behavior::Answer(answer) => Ok(answer),
            Behavior::Fail(e) => Err(e),
            Behavior::Hang => std::future::pending().await,
        };
        self.completed.lock().unwrap().push(address);
        result
    }
}

struct Entry {
    answer: Answer,
    expires_at: Instant,
}

/// Unbounded cache over tokio time.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<DnsQuery, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnswerCache for InMemoryCache {
    fn get(&self, query: &DnsQuery) -> Result<Option<CachedAnswer>, DomainError> {
        let entries = self.entries.lock().unwrap();
        let now = Instant::now();
        Ok(entries.get(query).and_then(|e| {
            (e.expires_at > now).then(|| CachedAnswer {
                answer: e.answer.clone(),
                remaining: e.expires_at - now,
            })
        }))
    }

    fn put(&self, query: &DnsQuery, answer: Answer, lifetime: Duration) -> Result<(), DomainError> {
        self.entries.lock().unwrap().insert(
            query.clone(),
            Entry {
                answer,
                expires_at: Instant::now() + lifetime,
            },
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

pub struct BrokenCache;

impl AnswerCache for BrokenCache {
    fn get(&self, _query: &DnsQuery) -> Result<Option<CachedAnswer>, DomainError> {
        Err(DomainError::CacheUnavailable("poisoned".to_string()))
    }

    fn put(&self, _query: &DnsQuery, _answer: Answer, _lifetime: Duration) -> Result<(), DomainError> {
        Err(DomainError::CacheUnavailable("poisoned".to_string()))
    }

    fn len(&self) -> usize {
        0
    }
}

#[derive(Default)]
pub struct StaticHosts {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticHosts {
    pub fn with(mut self, name: &str, ips: &[&str]) -> Self {
        self.entries.insert(
            canonical_name(name),
            ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        );
        self
    }
}

impl HostsResolver for StaticHosts {
    fn lookup(&self, name: &str) -> Option<Vec<IpAddr>> {
        self.entries.get(&canonical_name(name)).cloned()
    }
}

pub const PRIMARY: &str = "10.0.0.1:53";
pub const PRIMARY_2: &str = "10.0.0.2:53";
pub const ALTERNATIVE: &str = "10.0.1.1:53";
pub const ALTERNATIVE_2: &str = "10.0.1.2:53";

pub fn upstream(address: &str) -> Upstream {
    Upstream::new(address, address, UpstreamProtocol::Udp, Duration::from_secs(2))
}

pub fn a_answer(name: &str, ips: &[[u8; 4]], ttl: u32) -> Answer {
    Answer::new(
        ResponseCode::NoError,
        ips.iter()
            .map(|ip| ResourceRecord::new(name, ttl, RecordData::A(Ipv4Addr::from(*ip))))
            .collect(),
    )
}

pub fn a_query(name: &str) -> DnsQuery {
    DnsQuery::new(name, RecordType::A)
}

pub fn first_ipv4(answer: &Answer) -> Option<Ipv4Addr> {
    answer.ipv4_addresses().next()
}

pub fn client() -> Arc<MockUpstreamClient> {
    Arc::new(MockUpstreamClient::new())
}
