//! 协议栈模块
//!
//! 线路仿真、二层交换、ARP、三层路由和 ping，全部挂在 [`Network`] 运行时上。

mod arp;
mod event;
mod frame;
mod layer2;
mod layer3;
mod layer5;
mod network;
pub(crate) mod transport;

pub use event::StackEvent;
pub use frame::{
    ArpOp, ArpPacket, ETH_FCS_LEN, ETH_PAYLOAD_LEN, EtherType, EthernetFrame, IpHeader, VLAN_TPID,
    WireRecord,
};
pub use layer2::{l2_egress, valid_l2_intf};
pub use network::Network;
