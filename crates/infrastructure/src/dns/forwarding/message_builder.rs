//! DNS Message Builder
//!
//! Builds outbound queries and inbound responses in wire format using
//! `hickory-proto`.

use super::record_type_map::RecordTypeMapper;
use ferrous_split_domain::{Answer, DnsQuery, DomainError, RecordData, ResourceRecord};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, NULL};
use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Builds a recursive query with a random ID and a single question.
    ///
    /// Returns the ID alongside the bytes so the caller can match the
    /// response.
    pub fn build_query(query: &DnsQuery) -> Result<(u16, Vec<u8>), DomainError> {
        let name = parse_name(&query.name)?;

        let mut question = Query::query(name, RecordTypeMapper::to_hickory(query.record_type));
        question.set_query_class(RecordTypeMapper::class_to_hickory(query.class));

        let id = fastrand::u16(..);

        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(question);

        let bytes = Self::serialize_message(&message)?;
        Ok((id, bytes))
    }

    /// Builds the reply to `request` carrying `answer`: same ID, opcode,
    /// RD flag and question section, RA set.
    pub fn build_response(request: &Message, answer: &Answer) -> Result<Message, DomainError> {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(true)
            .set_truncated(answer.truncated)
            .set_response_code(RecordTypeMapper::rcode_to_hickory(answer.rcode));
        response.add_queries(request.queries().iter().cloned());

        for record in &answer.records {
            response.add_answer(to_hickory_record(record)?);
        }

        Ok(response)
    }

    /// Serialize a message to wire format
    pub fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buffer = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buffer);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDomainName(format!("Failed to serialize DNS message: {}", e))
        })?;
        Ok(buffer)
    }
}

fn parse_name(name: &str) -> Result<Name, DomainError> {
    Name::from_str(name)
        .map_err(|e| DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", name, e)))
}

fn to_hickory_record(record: &ResourceRecord) -> Result<Record, DomainError> {
    let name = parse_name(&record.name)?;
    let rdata = match &record.data {
        RecordData::A(ip) => RData::A(A(*ip)),
        RecordData::Aaaa(ip) => RData::AAAA(AAAA(*ip)),
        RecordData::Cname(target) => RData::CNAME(CNAME(parse_name(target)?)),
        RecordData::Opaque { code, rdata } => RData::Unknown {
            code: hickory_proto::rr::RecordType::from(*code),
            rdata: NULL::with(rdata.to_vec()),
        },
    };
    Ok(Record::from_rdata(name, record.ttl, rdata))
}
