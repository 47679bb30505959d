//! 网络拓扑模块
//!
//! 此模块包含拓扑图的数据模型：节点、接口、链路、地址以及每个节点的 ARP/MAC/路由表。

// 子模块声明
mod addr;
mod dump;
mod graph;
mod id;
mod link;
mod node;
mod routing;
mod stats;
mod tables;

// 重新导出公共接口
pub use addr::{Ipv4Cidr, MacAddr, apply_mask, mask_of, parse_ip};
pub use graph::Graph;
pub use id::{IntfId, LinkId, NodeId};
pub use link::Link;
pub use node::{IntfProp, Interface, L2Mode, MAX_INTF_NAME_LEN, MAX_INTF_PER_NODE, MAX_VLAN_MEMBERSHIP, Node};
pub use routing::{RouteEntry, RoutingTable};
pub use stats::{NodeStats, NodeStatsSnapshot};
pub use tables::{ArpEntry, ArpTable, MacEntry, MacTable};
