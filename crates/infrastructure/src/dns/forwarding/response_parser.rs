use super::record_type_map::RecordTypeMapper;
use ferrous_split_domain::dns_query::canonical_name;
use ferrous_split_domain::{Answer, DomainError, RecordData, ResourceRecord};
use hickory_proto::op::Message;
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::sync::Arc;
use tracing::debug;

/// Upstream response reduced to what the dispatcher needs.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub id: u16,

    pub truncated: bool,

    pub answer: Answer,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes an upstream response. Only the answer section is kept; A,
    /// AAAA and CNAME data are decoded, anything else is carried as raw
    /// RDATA.
    pub fn parse(response_bytes: &[u8], server: &str) -> Result<ParsedResponse, DomainError> {
        let message = Message::from_vec(response_bytes)
            .map_err(|e| DomainError::malformed(server, format!("undecodable response: {}", e)))?;

        let records = message
            .answers()
            .iter()
            .map(|record| convert_record(record, server))
            .collect::<Result<Vec<_>, _>>()?;

        let rcode = RecordTypeMapper::rcode_from_hickory(message.response_code());
        let truncated = message.truncated();

        debug!(
            server = %server,
            rcode = %rcode,
            answers = records.len(),
            truncated,
            "Upstream response parsed"
        );

        let mut answer = Answer::new(rcode, records);
        answer.truncated = truncated;

        Ok(ParsedResponse {
            id: message.id(),
            truncated,
            answer,
        })
    }
}

fn convert_record(record: &Record, server: &str) -> Result<ResourceRecord, DomainError> {
    let data = match record.data() {
        RData::A(a) => RecordData::A(a.0),
        RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
        RData::CNAME(cname) => RecordData::Cname(Arc::from(canonical_name(&cname.0.to_ascii()))),
        other => {
            let rdata = opaque_rdata(other).map_err(|e| {
                DomainError::malformed(server, format!("unencodable RDATA: {}", e))
            })?;
            RecordData::Opaque {
                code: u16::from(record.record_type()),
                rdata: Arc::from(rdata),
            }
        }
    };

    Ok(ResourceRecord::new(
        canonical_name(&record.name().to_ascii()),
        record.ttl(),
        data,
    ))
}

/// Opaque RDATA is spliced into other messages, so embedded names must not
/// carry compression pointers into this scratch buffer.
fn opaque_rdata(rdata: &RData) -> Result<Vec<u8>, hickory_proto::ProtoError> {
    let mut buffer = Vec::with_capacity(64);
    let mut encoder = BinEncoder::new(&mut buffer);
    encoder.set_canonical_names(true);
    rdata.emit(&mut encoder)?;
    Ok(buffer)
}
