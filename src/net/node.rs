//! 节点与接口
//!
//! 每个节点最多 10 个接口槽位，外加回环地址、传输端点和三张表。

use std::net::{Ipv4Addr, SocketAddr};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::addr::{MacAddr, apply_mask};
use super::id::{IntfId, LinkId, NodeId};
use super::routing::RoutingTable;
use super::stats::NodeStats;
use super::tables::{ArpTable, MacTable};

pub const MAX_INTF_PER_NODE: usize = 10;
pub const MAX_VLAN_MEMBERSHIP: usize = 10;
/// 接口名在线路记录里用一个字节表示长度
pub const MAX_INTF_NAME_LEN: usize = u8::MAX as usize;

/// 二层端口模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum L2Mode {
    Access,
    Trunk,
}

/// 接口属性，三种状态互斥
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntfProp {
    #[default]
    Unconfigured,
    L3 {
        ip: Ipv4Addr,
        prefix_len: u8,
        mac: MacAddr,
    },
    /// access 端口最多只使用一个 VLAN
    L2 { mode: L2Mode, vlans: Vec<u16> },
}

/// 节点上的一个接口
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub id: IntfId,
    pub link: LinkId,
    pub prop: IntfProp,
}

impl Interface {
    pub fn node(&self) -> NodeId {
        self.id.node
    }

    pub fn ip(&self) -> Option<(Ipv4Addr, u8)> {
        match self.prop {
            IntfProp::L3 { ip, prefix_len, .. } => Some((ip, prefix_len)),
            _ => None,
        }
    }

    pub fn mac(&self) -> Option<MacAddr> {
        match self.prop {
            IntfProp::L3 { mac, .. } => Some(mac),
            _ => None,
        }
    }

    pub fn is_l3(&self) -> bool {
        matches!(self.prop, IntfProp::L3 { .. })
    }

    pub fn l2_mode(&self) -> Option<L2Mode> {
        match self.prop {
            IntfProp::L2 { mode, .. } => Some(mode),
            _ => None,
        }
    }

    pub fn vlans(&self) -> &[u16] {
        match &self.prop {
            IntfProp::L2 { vlans, .. } => vlans,
            _ => &[],
        }
    }

    /// access 端口的 VLAN，未设置时为 None
    pub fn access_vlan(&self) -> Option<u16> {
        match &self.prop {
            IntfProp::L2 {
                mode: L2Mode::Access,
                vlans,
            } => vlans.first().copied(),
            _ => None,
        }
    }

    pub fn is_vlan_member(&self, vlan: u16) -> bool {
        self.vlans().contains(&vlan)
    }

    /// 地址是否落在本接口子网内
    pub fn subnet_contains(&self, addr: Ipv4Addr) -> bool {
        match self.ip() {
            Some((ip, prefix_len)) => apply_mask(ip, prefix_len) == apply_mask(addr, prefix_len),
            None => false,
        }
    }
}

/// 网络节点
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub(crate) intfs: [Option<Interface>; MAX_INTF_PER_NODE],
    pub loopback: Option<Ipv4Addr>,
    /// 线路仿真用的 UDP 端点，网络启动时分配
    pub endpoint: Option<SocketAddr>,
    pub arp_table: Mutex<ArpTable>,
    pub mac_table: Mutex<MacTable>,
    pub routing_table: Mutex<RoutingTable>,
    pub stats: NodeStats,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            intfs: Default::default(),
            loopback: None,
            endpoint: None,
            arp_table: Mutex::new(ArpTable::default()),
            mac_table: Mutex::new(MacTable::default()),
            routing_table: Mutex::new(RoutingTable::default()),
            stats: NodeStats::default(),
        }
    }

    pub(crate) fn free_slot(&self) -> Option<usize> {
        self.intfs.iter().position(Option::is_none)
    }

    /// 已占用的接口，按槽位顺序
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.intfs.iter().flatten()
    }

    pub fn intf(&self, slot: usize) -> Option<&Interface> {
        self.intfs.get(slot).and_then(Option::as_ref)
    }

    pub fn intf_by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces().find(|intf| intf.name == name)
    }

    pub(crate) fn intf_by_name_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.intfs.iter_mut().flatten().find(|intf| intf.name == name)
    }

    /// 找到子网包含 `ip` 的 L3 接口
    pub fn matching_subnet(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces().find(|intf| intf.subnet_contains(ip))
    }

    /// `ip` 是否为本节点的回环地址或任一接口地址
    pub fn is_local_address(&self, ip: Ipv4Addr) -> bool {
        self.loopback == Some(ip)
            || self
                .interfaces()
                .any(|intf| intf.ip().is_some_and(|(addr, _)| addr == ip))
    }
}
