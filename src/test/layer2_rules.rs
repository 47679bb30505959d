use crate::net::{IntfId, IntfProp, Interface, L2Mode, LinkId, MacAddr, NodeId};
use crate::stack::{EtherType, EthernetFrame, l2_egress, valid_l2_intf};
use std::net::Ipv4Addr;

const OWN: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x11]);
const OTHER: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x22]);

fn intf(prop: IntfProp) -> Interface {
    Interface {
        name: "p".to_string(),
        id: IntfId {
            node: NodeId(0),
            slot: 0,
        },
        link: LinkId(0),
        prop,
    }
}

fn access(vlan: Option<u16>) -> Interface {
    intf(IntfProp::L2 {
        mode: L2Mode::Access,
        vlans: vlan.into_iter().collect(),
    })
}

fn trunk(vlans: &[u16]) -> Interface {
    intf(IntfProp::L2 {
        mode: L2Mode::Trunk,
        vlans: vlans.to_vec(),
    })
}

fn frame(dst: MacAddr) -> EthernetFrame {
    EthernetFrame::new(dst, OTHER, EtherType::Ip, &[]).unwrap()
}

#[test]
fn l3_interface_accepts_own_or_broadcast_untagged() {
    let i = intf(IntfProp::L3 {
        ip: Ipv4Addr::new(10, 1, 1, 1),
        prefix_len: 24,
        mac: OWN,
    });
    assert!(valid_l2_intf(&i, frame(OWN)).is_some());
    assert!(valid_l2_intf(&i, frame(MacAddr::BROADCAST)).is_some());
    assert!(valid_l2_intf(&i, frame(OTHER)).is_none());
    assert!(valid_l2_intf(&i, frame(OWN).tagged(10)).is_none());
}

#[test]
fn unconfigured_interface_rejects_everything() {
    let i = intf(IntfProp::Unconfigured);
    assert!(valid_l2_intf(&i, frame(MacAddr::BROADCAST)).is_none());
}

#[test]
fn access_port_tags_on_ingress_and_strips_on_egress() {
    let i = access(Some(10));

    let tagged = valid_l2_intf(&i, frame(OTHER)).unwrap();
    assert_eq!(tagged.vlan, Some(10));
    assert!(valid_l2_intf(&i, frame(OTHER).tagged(10)).is_some());
    assert!(valid_l2_intf(&i, frame(OTHER).tagged(20)).is_none());

    let out = l2_egress(&i, &tagged).unwrap();
    assert_eq!(out.vlan, None);
    assert!(l2_egress(&i, &frame(OTHER).tagged(20)).is_none());
    assert!(l2_egress(&i, &frame(OTHER)).is_none());
}

#[test]
fn access_port_without_vlan() {
    let i = access(None);
    assert!(valid_l2_intf(&i, frame(OTHER)).is_none());
    assert!(valid_l2_intf(&i, frame(OTHER).tagged(10)).is_none());
    // untagged frame and no port vlan goes out as is
    assert_eq!(l2_egress(&i, &frame(OTHER)).unwrap().vlan, None);
}

#[test]
fn trunk_port_only_carries_member_vlans() {
    let i = trunk(&[10, 30]);
    assert!(valid_l2_intf(&i, frame(OTHER)).is_none());
    assert!(valid_l2_intf(&i, frame(OTHER).tagged(10)).is_some());
    assert!(valid_l2_intf(&i, frame(OTHER).tagged(20)).is_none());

    assert_eq!(l2_egress(&i, &frame(OTHER).tagged(30)).unwrap().vlan, Some(30));
    assert!(l2_egress(&i, &frame(OTHER).tagged(20)).is_none());
    assert!(l2_egress(&i, &frame(OTHER)).is_none());
}

#[test]
fn l3_interface_is_skipped_on_switch_egress() {
    let i = intf(IntfProp::L3 {
        ip: Ipv4Addr::new(10, 1, 1, 1),
        prefix_len: 24,
        mac: OWN,
    });
    assert!(l2_egress(&i, &frame(OTHER)).is_none());
}
