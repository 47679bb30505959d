use crate::net::{RouteEntry, RoutingTable};
use std::net::Ipv4Addr;

fn via(dst: [u8; 4], prefix_len: u8, gw: [u8; 4], intf: &str) -> RouteEntry {
    RouteEntry::via(Ipv4Addr::from(dst), prefix_len, Ipv4Addr::from(gw), intf)
}

#[test]
fn longest_prefix_wins_regardless_of_install_order() {
    let wide = via([10, 0, 0, 0], 16, [1, 1, 1, 16], "eth16");
    let narrow = via([10, 0, 0, 0], 24, [1, 1, 1, 24], "eth24");
    let probe = Ipv4Addr::new(10, 0, 0, 5);

    for order in [[wide.clone(), narrow.clone()], [narrow.clone(), wide.clone()]] {
        let mut rt = RoutingTable::default();
        for r in order {
            rt.upsert(r);
        }
        assert_eq!(rt.len(), 2);
        let hit = rt.lookup(probe).unwrap();
        assert_eq!(hit.prefix_len, 24);
        assert_eq!(hit.out_intf.as_deref(), Some("eth24"));
    }
}

#[test]
fn wider_prefix_catches_what_narrow_misses() {
    let mut rt = RoutingTable::default();
    rt.upsert(via([10, 0, 0, 0], 16, [1, 1, 1, 16], "eth16"));
    rt.upsert(via([10, 0, 0, 0], 24, [1, 1, 1, 24], "eth24"));
    assert_eq!(rt.lookup(Ipv4Addr::new(10, 0, 9, 1)).unwrap().prefix_len, 16);
    assert!(rt.lookup(Ipv4Addr::new(11, 0, 0, 1)).is_none());
}

#[test]
fn same_prefix_overwrites_in_place() {
    let mut rt = RoutingTable::default();
    rt.upsert(RouteEntry::direct(Ipv4Addr::new(122, 1, 1, 1), 32));
    rt.upsert(via([10, 0, 0, 0], 24, [1, 1, 1, 1], "a"));
    rt.upsert(via([10, 0, 0, 99], 24, [2, 2, 2, 2], "b"));

    assert_eq!(rt.len(), 2);
    // position is kept
    let second = &rt.entries()[1];
    assert_eq!(second.dst, Ipv4Addr::new(10, 0, 0, 0));
    assert_eq!(second.gateway, Some(Ipv4Addr::new(2, 2, 2, 2)));
    assert_eq!(second.out_intf.as_deref(), Some("b"));
}

#[test]
fn default_route_matches_everything() {
    let mut rt = RoutingTable::default();
    rt.upsert(via([0, 0, 0, 0], 0, [9, 9, 9, 9], "up"));
    rt.upsert(RouteEntry::direct(Ipv4Addr::new(10, 1, 1, 0), 24));

    assert_eq!(rt.lookup(Ipv4Addr::new(8, 8, 8, 8)).unwrap().prefix_len, 0);
    assert!(rt.lookup(Ipv4Addr::new(10, 1, 1, 3)).unwrap().is_direct);

    assert!(rt.delete(Ipv4Addr::new(0, 0, 0, 0), 0).is_some());
    assert!(rt.lookup(Ipv4Addr::new(8, 8, 8, 8)).is_none());
}
