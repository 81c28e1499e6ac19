use super::dispatch::{AnswerSource, Dispatcher, Resolution};
use ferrous_split_domain::{Answer, DnsQuery, RecordType};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Query-type and TTL policy wrapped around the dispatcher.
pub struct HandleDnsQueryUseCase {
    dispatcher: Arc<Dispatcher>,
    minimum_ttl: u32,
    reject_qtypes: Arc<[RecordType]>,
}

impl HandleDnsQueryUseCase {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            minimum_ttl: 0,
            reject_qtypes: Arc::from(Vec::new()),
        }
    }

    pub fn with_minimum_ttl(mut self, minimum_ttl: u32) -> Self {
        self.minimum_ttl = minimum_ttl;
        self
    }

    pub fn with_rejected_types(mut self, types: Vec<RecordType>) -> Self {
        self.reject_qtypes = types.into();
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_rejected(&self, record_type: RecordType) -> bool {
        self.reject_qtypes.contains(&record_type)
    }

    pub async fn execute(&self, query: &DnsQuery) -> Answer {
        let start = Instant::now();

        if self.is_rejected(query.record_type) {
            debug!(name = %query.name, qtype = %query.record_type, "Query type rejected");
            return Answer::refused();
        }

        let Resolution {
            answer,
            source,
            upstream,
        } = self.dispatcher.resolve(query).await;

        let answer = if self.minimum_ttl > 0 && source != AnswerSource::ServFail {
            answer.with_ttl_floor(self.minimum_ttl)
        } else {
            answer
        };

        debug!(
            name = %query.name,
            qtype = %query.record_type,
            source = %source,
            upstream = upstream.as_deref().unwrap_or("-"),
            rcode = %answer.rcode,
            records = answer.records.len(),
            latency_us = start.elapsed().as_micros() as u64,
            "Query handled"
        );

        answer
    }
}
