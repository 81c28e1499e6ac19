mod helpers;

use ferrous_split_application::use_cases::{Dispatcher, HandleDnsQueryUseCase};
use ferrous_split_domain::{DnsQuery, RecordData, RecordType, ResourceRecord, ResponseCode};
use helpers::*;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

fn use_case(client: &Arc<MockUpstreamClient>) -> HandleDnsQueryUseCase {
    let dispatcher = Dispatcher::builder(client.clone(), vec![upstream(PRIMARY)], vec![upstream(ALTERNATIVE)]).build();
    HandleDnsQueryUseCase::new(Arc::new(dispatcher))
}

#[tokio::test(start_paused = true)]
async fn test_rejected_type_never_reaches_dispatcher() {
    let client = client();
    let use_case = use_case(&client).with_rejected_types(vec![RecordType::ANY, RecordType::Unknown(65280)]);

    let answer = use_case
        .execute(&DnsQuery::new("example.com", RecordType::ANY))
        .await;
    assert_eq!(answer.rcode, ResponseCode::Refused);

    let answer = use_case
        .execute(&DnsQuery::new("example.com", RecordType::from_u16(65280)))
        .await;
    assert_eq!(answer.rcode, ResponseCode::Refused);

    assert_eq!(client.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_minimum_ttl_raises_but_never_lowers() {
    let client = client();
    let mut answer = a_answer("example.com.", &[[192, 0, 2, 1]], 60);
    answer
        .records
        .push(ResourceRecord::new("example.com.", 600, RecordData::A(Ipv4Addr::new(192, 0, 2, 2))));
    client.answer(PRIMARY, answer, Duration::ZERO);
    client.hang(ALTERNATIVE);

    let use_case = use_case(&client).with_minimum_ttl(300);
    let answer = use_case.execute(&a_query("example.com")).await;

    let ttls: Vec<u32> = answer.records.iter().map(|r| r.ttl).collect();
    assert_eq!(ttls, vec![300, 600]);
}

#[tokio::test(start_paused = true)]
async fn test_zero_minimum_ttl_keeps_upstream_ttls() {
    let client = client();
    client.answer(PRIMARY, a_answer("example.com.", &[[192, 0, 2, 1]], 7), Duration::ZERO);
    client.hang(ALTERNATIVE);

    let answer = use_case(&client).execute(&a_query("example.com")).await;
    assert_eq!(answer.records[0].ttl, 7);
}

#[tokio::test(start_paused = true)]
async fn test_unrejected_types_pass_through() {
    let client = client();
    client.answer(PRIMARY, a_answer("example.com.", &[[192, 0, 2, 1]], 60), Duration::ZERO);
    client.hang(ALTERNATIVE);

    let use_case = use_case(&client).with_rejected_types(vec![RecordType::ANY]);
    assert!(use_case.is_rejected(RecordType::ANY));
    assert!(!use_case.is_rejected(RecordType::A));

    let answer = use_case.execute(&a_query("example.com")).await;
    assert_eq!(answer.rcode, ResponseCode::NoError);
    assert_eq!(client.calls_to(PRIMARY), 1);
}

#[tokio::test(start_paused = true)]
async fn test_servfail_passes_through_policy() {
    let client = client();
    client.fail(PRIMARY, Duration::ZERO);
    client.fail(ALTERNATIVE, Duration::ZERO);

    let use_case = use_case(&client).with_minimum_ttl(300);
    let answer = use_case.execute(&a_query("example.com")).await;
    assert_eq!(answer.rcode, ResponseCode::ServFail);
    assert!(answer.records.is_empty());
}
