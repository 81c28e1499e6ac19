//! Mapping between the domain's record/class/rcode types and `hickory_proto`'s.
//!
//! Both sides agree on the IANA numeric codes, so every conversion goes
//! through `u16` and unknown values survive the round trip.

use ferrous_split_domain::{DnsClass, RecordType, ResponseCode};
use hickory_proto::op::ResponseCode as HickoryResponseCode;
use hickory_proto::rr::{DNSClass, RecordType as HickoryRecordType};

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(record_type: RecordType) -> HickoryRecordType {
        HickoryRecordType::from(record_type.to_u16())
    }

    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        RecordType::from_u16(u16::from(hickory_type))
    }

    pub fn class_to_hickory(class: DnsClass) -> DNSClass {
        DNSClass::from(class.to_u16())
    }

    pub fn class_from_hickory(class: DNSClass) -> DnsClass {
        DnsClass::from_u16(u16::from(class))
    }

    pub fn rcode_to_hickory(rcode: ResponseCode) -> HickoryResponseCode {
        // `HickoryResponseCode::from` is an inherent (high, low) constructor.
        rcode.to_u16().into()
    }

    pub fn rcode_from_hickory(rcode: HickoryResponseCode) -> ResponseCode {
        ResponseCode::from_u16(u16::from(rcode))
    }
}
