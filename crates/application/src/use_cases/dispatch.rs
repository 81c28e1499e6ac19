use crate::ports::{AnswerCache, HostsResolver, UpstreamClient};
use crate::services::selection::{cache_lifetime, primary_verdict, PrimaryVerdict};
use crate::services::{nat64, Exchange, Matcher, UpstreamSet};
use ferrous_split_domain::{
    Answer, DnsQuery, DomainError, RecordType, ResourceRecord, ResponseCode, Upstream,
};
use ipnetwork::Ipv6Network;
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn, Instrument, Span};

/// TTL given to answers synthesized from the hosts table.
pub const HOSTS_TTL: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Hosts,
    Cache,
    Primary,
    Alternative,
    ServFail,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Cache => "cache",
            Self::Primary => "primary",
            Self::Alternative => "alternative",
            Self::ServFail => "servfail",
        }
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub answer: Answer,
    pub source: AnswerSource,
    /// Endpoint name when the answer came from an upstream.
    pub upstream: Option<Arc<str>>,
}

impl Resolution {
    fn local(answer: Answer, source: AnswerSource) -> Self {
        Self {
            answer,
            source,
            upstream: None,
        }
    }

    fn upstream(exchange: Exchange, source: AnswerSource) -> Self {
        Self {
            answer: exchange.answer,
            source,
            upstream: Some(exchange.upstream),
        }
    }

    fn servfail() -> Self {
        Self::local(Answer::servfail(), AnswerSource::ServFail)
    }
}

/// Aborts the wrapped task when dropped, so a losing or abandoned upstream
/// query never outlives the resolve that started it.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

/// The split-horizon resolution pipeline: hosts, cache, then the primary and
/// alternative upstream sets arbitrated by the matcher.
///
/// Everything a dispatcher holds is immutable; configuration changes build a
/// new one.
pub struct Dispatcher {
    primary: Arc<UpstreamSet>,
    alternative: Arc<UpstreamSet>,
    matcher: Arc<Matcher>,
    only_primary: bool,
    nat64_prefix: Option<Ipv6Network>,
    cache: Option<Arc<dyn AnswerCache>>,
    hosts: Option<Arc<dyn HostsResolver>>,
    span: Span,
}

impl Dispatcher {
    pub fn builder(
        client: Arc<dyn UpstreamClient>,
        primary: Vec<Upstream>,
        alternative: Vec<Upstream>,
    ) -> DispatcherBuilder {
        DispatcherBuilder::new(client, primary, alternative)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub async fn resolve(&self, query: &DnsQuery) -> Resolution {
        self.resolve_inner(query)
            .instrument(self.span.clone())
            .await
    }

    async fn resolve_inner(&self, query: &DnsQuery) -> Resolution {
        if let Some(answer) = self.hosts_answer(query) {
            return Resolution::local(answer, AnswerSource::Hosts);
        }

        if let Some(answer) = self.cached_answer(query) {
            return Resolution::local(answer, AnswerSource::Cache);
        }

        let resolution = match self.nat64_prefix {
            Some(prefix) if query.record_type == RecordType::AAAA => {
                let mut resolution = self.dispatch(&query.retyped(RecordType::A)).await;
                resolution.answer = nat64::synthesize(resolution.answer, &prefix);
                resolution
            }
            _ => self.dispatch(query).await,
        };

        if matches!(
            resolution.source,
            AnswerSource::Primary | AnswerSource::Alternative
        ) {
            self.store(query, &resolution.answer);
        }

        resolution
    }

    fn hosts_answer(&self, query: &DnsQuery) -> Option<Answer> {
        if !query.record_type.is_address() {
            return None;
        }
        let addresses = self.hosts.as_ref()?.lookup(&query.name)?;

        let records = addresses
            .into_iter()
            .filter(|ip| match ip {
                IpAddr::V4(_) => query.record_type == RecordType::A,
                IpAddr::V6(_) => query.record_type == RecordType::AAAA,
            })
            .map(|ip| ResourceRecord::address(Arc::clone(&query.name), HOSTS_TTL, ip))
            .collect();

        debug!(name = %query.name, "Answered from hosts");
        Some(Answer::new(ResponseCode::NoError, records))
    }

    fn cached_answer(&self, query: &DnsQuery) -> Option<Answer> {
        let cache = self.cache.as_ref()?;
        match cache.get(query) {
            Ok(Some(hit)) => {
                let remaining = u32::try_from(hit.remaining.as_secs()).unwrap_or(u32::MAX);
                Some(hit.answer.with_ttl_ceiling(remaining))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, name = %query.name, "Cache lookup failed, bypassing cache");
                None
            }
        }
    }

    fn store(&self, query: &DnsQuery, answer: &Answer) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let Some(lifetime) = cache_lifetime(answer) else {
            return;
        };
        if let Err(e) = cache.put(query, answer.clone(), lifetime) {
            warn!(error = %e, name = %query.name, "Cache write failed");
        }
    }

    async fn dispatch(&self, query: &DnsQuery) -> Resolution {
        if self.only_primary {
            return match self.primary.query(query).await {
                Ok(exchange) => Resolution::upstream(exchange, AnswerSource::Primary),
                Err(e) => {
                    debug!(error = %e, name = %query.name, "Primary failed");
                    Resolution::servfail()
                }
            };
        }

        if self.matcher.matches_domain(&query.name) {
            debug!(name = %query.name, "Domain listed, using alternative");
            let alternative = self.spawn_set(&self.alternative, query);
            return Self::alternative_or_servfail(alternative.await, query);
        }

        let primary = self.spawn_set(&self.primary, query);
        let alternative = self.spawn_set(&self.alternative, query);

        let primary_result = flatten(primary.await, self.primary.label());
        let verdict = primary_verdict(
            primary_result.as_ref().ok().map(|exchange| &exchange.answer),
            &self.matcher,
        );

        match (verdict, primary_result) {
            (PrimaryVerdict::Trusted, Ok(exchange)) => {
                drop(alternative);
                Resolution::upstream(exchange, AnswerSource::Primary)
            }
            (PrimaryVerdict::Untrusted(reason), primary_result) => {
                if let Err(e) = &primary_result {
                    debug!(error = %e, "Primary set failed");
                }
                debug!(name = %query.name, reason = %reason, "Falling back to alternative");
                Self::alternative_or_servfail(alternative.await, query)
            }
            (PrimaryVerdict::Trusted, Err(e)) => {
                // primary_verdict never trusts a failure
                warn!(error = %e, "Inconsistent primary verdict");
                Self::alternative_or_servfail(alternative.await, query)
            }
        }
    }

    fn spawn_set(
        &self,
        set: &Arc<UpstreamSet>,
        query: &DnsQuery,
    ) -> AbortOnDrop<Result<Exchange, DomainError>> {
        let set = Arc::clone(set);
        let query = query.clone();
        let handle = tokio::spawn(
            async move { set.query(&query).await }.instrument(self.span.clone()),
        );
        AbortOnDrop(handle)
    }

    fn alternative_or_servfail(
        joined: Result<Result<Exchange, DomainError>, JoinError>,
        query: &DnsQuery,
    ) -> Resolution {
        match flatten(joined, "alternative") {
            Ok(exchange) => Resolution::upstream(exchange, AnswerSource::Alternative),
            Err(e) => {
                debug!(error = %e, name = %query.name, "Alternative failed");
                Resolution::servfail()
            }
        }
    }
}

fn flatten(
    joined: Result<Result<Exchange, DomainError>, JoinError>,
    label: &str,
) -> Result<Exchange, DomainError> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            warn!(set = label, error = %e, "Upstream task did not complete");
            Err(DomainError::transport(label, e))
        }
    }
}

pub struct DispatcherBuilder {
    client: Arc<dyn UpstreamClient>,
    primary: Vec<Upstream>,
    alternative: Vec<Upstream>,
    matcher: Option<Arc<Matcher>>,
    only_primary: bool,
    nat64_prefix: Option<Ipv6Network>,
    cache: Option<Arc<dyn AnswerCache>>,
    hosts: Option<Arc<dyn HostsResolver>>,
    span: Span,
}

impl DispatcherBuilder {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        primary: Vec<Upstream>,
        alternative: Vec<Upstream>,
    ) -> Self {
        Self {
            client,
            primary,
            alternative,
            matcher: None,
            only_primary: false,
            nat64_prefix: None,
            cache: None,
            hosts: None,
            span: Span::none(),
        }
    }

    pub fn matcher(mut self, matcher: Arc<Matcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn only_primary(mut self, only_primary: bool) -> Self {
        self.only_primary = only_primary;
        self
    }

    /// Answer AAAA queries by synthesizing addresses inside `prefix` from the
    /// A answer.
    pub fn redirect_ipv6(mut self, prefix: Option<Ipv6Network>) -> Self {
        self.nat64_prefix = prefix;
        self
    }

    pub fn cache(mut self, cache: Option<Arc<dyn AnswerCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn hosts(mut self, hosts: Option<Arc<dyn HostsResolver>>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            primary: Arc::new(UpstreamSet::new(
                "primary",
                self.primary,
                Arc::clone(&self.client),
            )),
            alternative: Arc::new(UpstreamSet::new("alternative", self.alternative, self.client)),
            matcher: self.matcher.unwrap_or_default(),
            only_primary: self.only_primary,
            nat64_prefix: self.nat64_prefix,
            cache: self.cache,
            hosts: self.hosts,
            span: self.span,
        }
    }
}
