use crate::ports::UpstreamClient;
use ferrous_split_domain::{Answer, DnsQuery, DomainError, Upstream};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::debug;

/// Successful answer together with the endpoint that produced it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub answer: Answer,
    pub upstream: Arc<str>,
}

/// One configured group of upstreams (primary or alternative).
///
/// Every endpoint is queried at once. The set commits to the first endpoint,
/// in configured order, that answers successfully once every endpoint before
/// it has failed, so the outcome does not depend on which reply arrives
/// first.
pub struct UpstreamSet {
    label: &'static str,
    upstreams: Arc<[Upstream]>,
    client: Arc<dyn UpstreamClient>,
}

impl UpstreamSet {
    pub fn new(label: &'static str, upstreams: Vec<Upstream>, client: Arc<dyn UpstreamClient>) -> Self {
        Self {
            label,
            upstreams: upstreams.into(),
            client,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }

    pub async fn query(&self, query: &DnsQuery) -> Result<Exchange, DomainError> {
        if self.upstreams.is_empty() {
            return Err(DomainError::NoUpstreams);
        }

        let mut pending = FuturesUnordered::new();
        for (index, upstream) in self.upstreams.iter().enumerate() {
            let client = Arc::clone(&self.client);
            pending.push(async move {
                let result = match timeout(upstream.timeout, client.exchange(query, upstream)).await {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::timeout(&upstream.address)),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<Answer, DomainError>>> =
            (0..self.upstreams.len()).map(|_| None).collect();
        let mut next = 0;

        while let Some((index, result)) = pending.next().await {
            if let Err(e) = &result {
                debug!(
                    set = self.label,
                    upstream = %self.upstreams[index].name,
                    error = %e,
                    "Upstream exchange failed"
                );
            }
            results[index] = Some(result);

            while next < results.len() {
                match &results[next] {
                    Some(Ok(_)) => {
                        if let Some(Ok(answer)) = results[next].take() {
                            return Ok(Exchange {
                                answer,
                                upstream: Arc::clone(&self.upstreams[next].name),
                            });
                        }
                    }
                    Some(Err(_)) => next += 1,
                    None => break,
                }
            }

            if next == results.len() {
                break;
            }
        }

        match results.into_iter().next().flatten() {
            Some(Err(e)) => Err(e),
            _ => Err(DomainError::NoUpstreams),
        }
    }
}
