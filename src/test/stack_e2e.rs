use crate::config::StackConfig;
use crate::error::{ConfigError, StackError};
use crate::net::Graph;
use crate::stack::{Network, StackEvent};
use crate::topo::l2_switch::{build_l2_switch, build_vlan_switch};
use crate::topo::linear::build_linear3;
use crate::topo::triangle::build_triangle;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

fn fast_config() -> StackConfig {
    StackConfig {
        arp_retry_delay: Duration::from_millis(30),
        ..StackConfig::ephemeral()
    }
}

async fn start(graph: Graph) -> Arc<Network> {
    Network::start(graph, fast_config()).await.expect("network starts")
}

/// Collect events until `done` matches one, failing after a few seconds.
async fn wait_for(
    rx: &mut broadcast::Receiver<StackEvent>,
    mut done: impl FnMut(&StackEvent) -> bool,
) -> Vec<StackEvent> {
    let mut seen = Vec::new();
    let collect = async {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let stop = done(&ev);
                    seen.push(ev);
                    if stop {
                        return;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), collect)
        .await
        .expect("timed out waiting for event");
    seen
}

#[tokio::test(flavor = "multi_thread")]
async fn linear_ping_decrements_ttl_once_at_r2() {
    let net = start(build_linear3().unwrap()).await;
    let mut rx = net.subscribe();

    net.ping("R3", Ipv4Addr::new(10, 1, 1, 1)).unwrap();
    let seen = wait_for(&mut rx, |ev| matches!(ev, StackEvent::PingSuccessful { .. })).await;

    assert_eq!(
        seen.last(),
        Some(&StackEvent::PingSuccessful {
            node: "R1".to_string(),
            src: Ipv4Addr::new(122, 1, 1, 3),
            dst: Ipv4Addr::new(10, 1, 1, 1),
            ttl: 63,
        })
    );
    let forwarded: Vec<_> = seen
        .iter()
        .filter(|ev| matches!(ev, StackEvent::Forwarded { .. }))
        .collect();
    assert_eq!(
        forwarded,
        vec![&StackEvent::Forwarded {
            node: "R2".to_string(),
            dst: Ipv4Addr::new(10, 1, 1, 1),
            ttl: 63,
        }]
    );

    let r2 = net.node("R2").unwrap().stats.snapshot();
    assert_eq!(r2.forwarded_packets, 1);
    // R3 learned its gateway, R2 learned R1
    assert!(net.node("R3").unwrap().arp_table.lock().lookup(Ipv4Addr::new(11, 1, 1, 2)).is_some());
    assert!(net.node("R2").unwrap().arp_table.lock().lookup(Ipv4Addr::new(10, 1, 1, 1)).is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn first_send_right_after_start_goes_out() {
    let net = start(build_triangle().unwrap()).await;
    net.send_arp_broadcast("r0", None, Ipv4Addr::new(20, 1, 1, 2)).unwrap();
    net.send_arp_broadcast("r1", None, Ipv4Addr::new(30, 1, 1, 2)).unwrap();
    net.send_arp_broadcast("r2", None, Ipv4Addr::new(40, 1, 1, 1)).unwrap();

    let net = start(build_linear3().unwrap()).await;
    let mut rx = net.subscribe();
    net.ping("R1", Ipv4Addr::new(11, 1, 1, 1)).unwrap();
    wait_for(&mut rx, |ev| {
        matches!(ev, StackEvent::PingSuccessful { node, .. } if node == "R3")
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn arp_without_matching_subnet_is_a_config_error() {
    let net = start(build_linear3().unwrap()).await;
    let target = Ipv4Addr::new(99, 9, 9, 9);

    let err = net.send_arp_broadcast("R1", None, target).unwrap_err();
    assert!(matches!(
        err,
        StackError::Config(ConfigError::NoMatchingSubnet { ip, .. }) if ip == target
    ));
    let err = net.resolve("R1", target).await.unwrap_err();
    assert!(matches!(err, StackError::Config(ConfigError::NoMatchingSubnet { .. })));

    assert!(net.node("R1").unwrap().arp_table.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_returns_neighbor_mac_and_caches_it() {
    let net = start(build_linear3().unwrap()).await;
    let r2_eth2 = net.node("R2").unwrap().intf_by_name("eth2").unwrap().mac().unwrap();

    let mac = net.resolve("R1", Ipv4Addr::new(10, 1, 1, 2)).await.unwrap();
    assert_eq!(mac, r2_eth2);

    let r1 = net.node("R1").unwrap();
    let entry = r1.arp_table.lock().lookup(Ipv4Addr::new(10, 1, 1, 2)).cloned().unwrap();
    assert_eq!(entry.mac, r2_eth2);
    assert_eq!(entry.intf, "eth1");

    // cache hit
    assert_eq!(net.resolve("R1", Ipv4Addr::new(10, 1, 1, 2)).await.unwrap(), r2_eth2);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_resolves_share_one_request() {
    let net = start(build_linear3().unwrap()).await;
    let mut rx = net.subscribe();
    let ip = Ipv4Addr::new(10, 1, 1, 2);

    let (a, b) = tokio::join!(net.resolve("R1", ip), net.resolve("R1", ip));
    assert_eq!(a.unwrap(), b.unwrap());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut requests = 0;
    while let Ok(ev) = rx.try_recv() {
        if matches!(ev, StackEvent::ArpRequestReceived { ref node, .. } if node == "R2") {
            requests += 1;
        }
    }
    assert_eq!(requests, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unanswered_resolve_times_out() {
    let net = start(build_linear3().unwrap()).await;
    let err = net.resolve("R1", Ipv4Addr::new(10, 1, 1, 99)).await.unwrap_err();
    assert!(matches!(err, StackError::ArpUnresolved { ref node, .. } if node == "R1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolved_next_hop_drops_the_packet() {
    let net = start(build_linear3().unwrap()).await;
    let mut rx = net.subscribe();

    net.ping("R1", Ipv4Addr::new(10, 1, 1, 99)).unwrap();
    let seen = wait_for(&mut rx, |ev| matches!(ev, StackEvent::PacketDropped { .. })).await;
    assert!(matches!(
        seen.last(),
        Some(StackEvent::PacketDropped { node, .. }) if node == "R1"
    ));
    assert_eq!(net.node("R1").unwrap().stats.snapshot().dropped_packets, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn ping_without_route_fails_locally() {
    let net = start(build_linear3().unwrap()).await;
    let err = net.ping("R1", Ipv4Addr::new(99, 9, 9, 9)).unwrap_err();
    assert!(matches!(err, StackError::NoRoute { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn routing_loop_ends_in_ttl_exceeded() {
    let net = start(build_linear3().unwrap()).await;
    net.install_route("R1", "50.0.0.0", 8, "10.1.1.2", "eth1").unwrap();
    net.install_route("R2", "50.0.0.0", 8, "10.1.1.1", "eth2").unwrap();
    let mut rx = net.subscribe();

    net.ping("R1", Ipv4Addr::new(50, 1, 1, 1)).unwrap();
    let seen = wait_for(&mut rx, |ev| matches!(ev, StackEvent::PacketDropped { .. })).await;
    let Some(StackEvent::PacketDropped { reason, .. }) = seen.last() else {
        unreachable!();
    };
    assert!(reason.contains("TTL"), "unexpected reason: {reason}");

    let hops = seen
        .iter()
        .filter(|ev| matches!(ev, StackEvent::Forwarded { .. }))
        .count();
    assert_eq!(hops, 63);
}

#[tokio::test(flavor = "multi_thread")]
async fn ping_through_l2_switch_learns_macs() {
    let net = start(build_l2_switch().unwrap()).await;
    let mut rx = net.subscribe();

    net.ping("H1", Ipv4Addr::new(10, 1, 1, 1)).unwrap();
    let seen = wait_for(&mut rx, |ev| matches!(ev, StackEvent::PingSuccessful { .. })).await;
    assert!(matches!(
        seen.last(),
        Some(StackEvent::PingSuccessful { node, ttl: 64, .. }) if node == "H3"
    ));

    // only the ARP broadcast reaches the bystanders; the ping itself is unicast
    tokio::time::sleep(Duration::from_millis(100)).await;
    let rx_of = |name: &str| net.node(name).unwrap().stats.snapshot().rx_datagrams;
    assert_eq!(rx_of("H2"), 1);
    assert_eq!(rx_of("H4"), 1);
    assert_eq!(rx_of("H3"), 2);

    let sw = net.node("L2SW").unwrap();
    let h1_mac = net.node("H1").unwrap().intf_by_name("eth0/5").unwrap().mac().unwrap();
    let h3_mac = net.node("H3").unwrap().intf_by_name("eth0/6").unwrap().mac().unwrap();
    let macs = sw.mac_table.lock();
    assert_eq!(macs.lookup(h1_mac).unwrap().intf, "eth0/4");
    assert_eq!(macs.lookup(h3_mac).unwrap().intf, "eth0/2");
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_stays_inside_its_vlan() {
    let net = start(build_vlan_switch().unwrap()).await;
    let mut rx = net.subscribe();

    net.send_arp_broadcast("H1", None, Ipv4Addr::new(10, 1, 1, 2)).unwrap();
    wait_for(&mut rx, |ev| {
        matches!(ev, StackEvent::ArpResolved { node, .. } if node == "H1")
    })
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let h2 = net.node("H2").unwrap().stats.snapshot();
    let h3 = net.node("H3").unwrap().stats.snapshot();
    assert_eq!(h2.rx_datagrams, 1);
    assert_eq!(h3.rx_datagrams, 0);
    while let Ok(ev) = rx.try_recv() {
        assert!(
            !matches!(&ev, StackEvent::ArpRequestReceived { node, .. } if node == "H3"),
            "H3 saw {ev:?}"
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_arp_all_reaches_every_neighbor() {
    let net = start(build_triangle().unwrap()).await;
    let mut rx = net.subscribe();

    assert_eq!(net.resolve_arp_all("r0").unwrap(), 2);
    let mut resolved = 0;
    wait_for(&mut rx, |ev| {
        if matches!(ev, StackEvent::ArpResolved { node, .. } if node == "r0") {
            resolved += 1;
        }
        resolved == 2
    })
    .await;

    let r0 = net.node("r0").unwrap();
    let arp = r0.arp_table.lock();
    assert!(arp.lookup(Ipv4Addr::new(20, 1, 1, 2)).is_some());
    assert!(arp.lookup(Ipv4Addr::new(40, 1, 1, 2)).is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn endpoints_are_bound_in_node_order() {
    let net = start(build_triangle().unwrap()).await;
    let endpoints: Vec<_> = net
        .graph()
        .nodes()
        .iter()
        .map(|n| n.endpoint.expect("bound"))
        .collect();
    assert_eq!(endpoints.len(), 3);
    assert!(endpoints.iter().all(|ep| ep.ip().is_loopback()));
    let mut ports: Vec<_> = endpoints.iter().map(|ep| ep.port()).collect();
    ports.sort_unstable();
    ports.dedup();
    assert_eq!(ports.len(), 3);
}

#[test]
fn only_icmp_style_recv_errors_skip_the_backoff() {
    use crate::stack::transport::is_transient_recv_error;
    use std::io::ErrorKind;

    assert!(is_transient_recv_error(ErrorKind::ConnectionReset));
    assert!(is_transient_recv_error(ErrorKind::ConnectionRefused));
    assert!(!is_transient_recv_error(ErrorKind::PermissionDenied));
    assert!(!is_transient_recv_error(ErrorKind::Other));
}

#[tokio::test(flavor = "multi_thread")]
async fn receive_tasks_stop_with_the_network() {
    let net = start(build_linear3().unwrap()).await;
    let r1 = net.node("R1").unwrap().endpoint.unwrap();
    net.shutdown();
    drop(net);

    // the port is free again once every receive task is gone
    tokio::time::sleep(Duration::from_millis(50)).await;
    std::net::UdpSocket::bind(r1).expect("endpoint released");
}
