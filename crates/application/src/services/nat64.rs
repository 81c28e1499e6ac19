//! RFC 6052 IPv4-embedded IPv6 address synthesis.

use ferrous_split_domain::{Answer, RecordData, ResourceRecord};
use ipnetwork::Ipv6Network;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Embeds `v4` into `prefix`. Octet 8 (bits 64..71) stays zero as RFC 6052
/// requires, which is why the address bytes skip it for /40../64 prefixes.
/// Prefix lengths other than 32, 40, 48, 56, 64 and 96 are rejected when the
/// configuration is finalized; here they are rounded down to whole octets.
pub fn embed(prefix: &Ipv6Network, v4: Ipv4Addr) -> Ipv6Addr {
    let mut bytes = prefix.network().octets();
    let start = usize::from(prefix.prefix() / 8);
    for b in bytes.iter_mut().skip(start) {
        *b = 0;
    }

    let mut pos = start;
    for octet in v4.octets() {
        if pos == 8 {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        bytes[pos] = octet;
        pos += 1;
    }

    Ipv6Addr::from(bytes)
}

/// Rewrites an A answer into an AAAA answer: A records become AAAA records
/// inside `prefix` with the same TTL, CNAMEs pass through, anything else is
/// dropped. The response code is kept.
pub fn synthesize(answer: Answer, prefix: &Ipv6Network) -> Answer {
    let records = answer
        .records
        .into_iter()
        .filter_map(|record| match record.data {
            RecordData::A(v4) => Some(ResourceRecord::new(
                record.name,
                record.ttl,
                RecordData::Aaaa(embed(prefix, v4)),
            )),
            RecordData::Cname(_) => Some(record),
            _ => None,
        })
        .collect();

    Answer {
        rcode: answer.rcode,
        records,
        truncated: answer.truncated,
    }
}
