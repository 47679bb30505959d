use crate::net::{ArpEntry, ArpTable, MacAddr, MacEntry, MacTable};
use std::net::Ipv4Addr;

fn arp(ip: [u8; 4], last: u8, intf: &str) -> ArpEntry {
    ArpEntry {
        ip: Ipv4Addr::from(ip),
        mac: MacAddr([0x02, 0, 0, 0, 0, last]),
        intf: intf.to_string(),
    }
}

#[test]
fn arp_insert_same_mac_is_noop() {
    let mut t = ArpTable::default();
    assert!(t.insert(arp([10, 1, 1, 2], 1, "eth0")));
    assert!(!t.insert(arp([10, 1, 1, 2], 1, "eth0")));
    assert_eq!(t.len(), 1);
}

#[test]
fn arp_insert_different_mac_replaces() {
    let mut t = ArpTable::default();
    t.insert(arp([10, 1, 1, 2], 1, "eth0"));
    t.insert(arp([10, 1, 1, 3], 3, "eth0"));
    assert!(t.insert(arp([10, 1, 1, 2], 9, "eth1")));

    assert_eq!(t.len(), 2);
    let e = t.lookup(Ipv4Addr::new(10, 1, 1, 2)).unwrap();
    assert_eq!(e.mac.0[5], 9);
    assert_eq!(e.intf, "eth1");
    // replaced entry moves to the end
    assert_eq!(t.entries()[1].ip, Ipv4Addr::new(10, 1, 1, 2));

    assert!(t.delete(Ipv4Addr::new(10, 1, 1, 2)).is_some());
    assert!(t.lookup(Ipv4Addr::new(10, 1, 1, 2)).is_none());
}

#[test]
fn mac_table_relearns_on_move() {
    let m = MacAddr([0x02, 0, 0, 0, 0, 7]);
    let mut t = MacTable::default();
    assert!(t.insert(MacEntry { mac: m, intf: "p1".into() }));
    assert!(!t.insert(MacEntry { mac: m, intf: "p1".into() }));
    assert_eq!(t.lookup(m).unwrap().intf, "p1");

    assert!(t.insert(MacEntry { mac: m, intf: "p2".into() }));
    assert_eq!(t.len(), 1);
    assert_eq!(t.lookup(m).unwrap().intf, "p2");

    t.delete(m);
    assert!(t.is_empty());
}
