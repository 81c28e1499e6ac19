use ferrous_split_domain::{DomainList, HostsTable, IpNetworkList};
use std::net::IpAddr;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[test]
fn test_domain_list_normalizes_patterns() {
    let list = DomainList::new(["Example.COM", "example.com.", "*.cdn.test", "", "."]);
    let patterns: Vec<&str> = list.patterns().iter().map(|p| &**p).collect();
    assert_eq!(patterns, vec!["cdn.test.", "example.com."]);
    assert_eq!(list.len(), 2);
}

#[test]
fn test_ip_network_list_parse_stops_at_first_bad_line() {
    let list = IpNetworkList::parse("1.0.1.0/24\n\n  1.0.2.0/23  \nnot-a-cidr\n10.0.0.0/8\n");
    assert_eq!(list.len(), 2);
    assert!(list.contains(ip("1.0.2.1")));
    assert!(!list.contains(ip("10.1.1.1")));
}

#[test]
fn test_ip_network_list_bare_address_ends_list() {
    let list = IpNetworkList::parse("1.0.1.0/24\n192.0.2.1\n10.0.0.0/8\n");
    assert_eq!(list.len(), 1);
}

#[test]
fn test_ip_network_list_edges() {
    let list = IpNetworkList::parse("192.0.2.0/24\n2001:db8::/32\n");

    assert!(list.contains(ip("192.0.2.0")));
    assert!(list.contains(ip("192.0.2.255")));
    assert!(!list.contains(ip("192.0.3.0")));
    assert!(!list.contains(ip("192.0.1.255")));

    assert!(list.contains(ip("2001:db8:ffff:ffff:ffff:ffff:ffff:ffff")));
    assert!(!list.contains(ip("2001:db9::")));
}

#[test]
fn test_ip_network_list_families_never_cross() {
    let v4_only = IpNetworkList::parse("0.0.0.0/0\n");
    assert!(!v4_only.contains(ip("::ffff:192.0.2.1")));
    assert!(!v4_only.contains(ip("::1")));

    let v6_only = IpNetworkList::parse("::/0\n");
    assert!(!v6_only.contains(ip("192.0.2.1")));
}

#[test]
fn test_hosts_table_parse() {
    let table = HostsTable::parse(
        "# comment line\n\
         127.0.0.1 localhost  Local.Test # trailing\n\
         ::1 localhost\n\
         not-an-ip bogus.test\n\
         fe80::1%eth0 link.test\n\
         \n\
         192.0.2.10\tone.test two.test\n",
    );

    assert_eq!(
        table.lookup("localhost"),
        Some(&[ip("127.0.0.1"), ip("::1")][..])
    );
    assert_eq!(table.lookup("LOCAL.test."), Some(&[ip("127.0.0.1")][..]));
    assert_eq!(table.lookup("two.test"), Some(&[ip("192.0.2.10")][..]));
    assert_eq!(table.lookup("link.test"), Some(&[ip("fe80::1")][..]));
    assert!(table.lookup("bogus.test").is_none());
    assert!(table.lookup("missing.test").is_none());
}

#[test]
fn test_hosts_table_insert_dedups() {
    let mut table = HostsTable::default();
    table.insert("a.test", ip("192.0.2.1"));
    table.insert("A.test.", ip("192.0.2.1"));
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("a.test").map(<[IpAddr]>::len), Some(1));
}
