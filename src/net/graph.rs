//! 网络拓扑管理
//!
//! 拓扑图拥有全部节点和链路；节点通过链路查找邻居。
//! 配置操作出错时拓扑保持不变。

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::addr::{MacAddr, apply_mask, parse_ip};
use super::id::{IntfId, LinkId, NodeId};
use super::link::Link;
use super::node::{IntfProp, Interface, L2Mode, MAX_INTF_NAME_LEN, MAX_VLAN_MEMBERSHIP, Node};
use super::routing::RouteEntry;
use crate::error::ConfigError;

/// 网络拓扑
#[derive(Debug, Default)]
pub struct Graph {
    pub name: String,
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// 添加节点，名字必须唯一
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeId, ConfigError> {
        let name = name.into();
        if self.node_id(&name).is_some() {
            return Err(ConfigError::DuplicateNode(name));
        }
        let id = NodeId(self.nodes.len());
        debug!(node = %name, id = id.0, "添加节点");
        self.nodes.push(Node::new(id, name));
        Ok(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// 按名字查找节点
    pub fn node_by_name(&self, name: &str) -> Result<&Node, ConfigError> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ConfigError::NoSuchNode(name.to_string()))
    }

    fn node_by_name_mut(&mut self, name: &str) -> Result<&mut Node, ConfigError> {
        self.nodes
            .iter_mut()
            .find(|n| n.name == name)
            .ok_or_else(|| ConfigError::NoSuchNode(name.to_string()))
    }

    pub fn intf(&self, id: IntfId) -> Option<&Interface> {
        self.node(id.node)?.intf(id.slot)
    }

    /// 邻居查找：沿链路走到另一端接口
    pub fn nbr(&self, id: IntfId) -> Option<&Interface> {
        let link = self.links.get(self.intf(id)?.link.0)?;
        self.intf(link.other_end(id))
    }

    /// 用链路连接两个节点的具名接口；任一节点没有空槽位则失败
    pub fn insert_link(
        &mut self,
        a: &str,
        b: &str,
        a_intf: &str,
        b_intf: &str,
        cost: u32,
    ) -> Result<LinkId, ConfigError> {
        let a_id = self.node_by_name(a)?.id;
        let b_id = self.node_by_name(b)?.id;
        let a_slot = self.check_new_intf(a_id, a_intf)?;
        let b_slot = self.check_new_intf(b_id, b_intf)?;
        if a_id == b_id && a_intf == b_intf {
            return Err(ConfigError::DuplicateInterface {
                node: a.to_string(),
                intf: b_intf.to_string(),
            });
        }
        // 同一节点自环时需要第二个空槽位
        let b_slot = if a_id == b_id {
            self.nodes[a_id.0]
                .intfs
                .iter()
                .enumerate()
                .skip(a_slot + 1)
                .find(|(_, s)| s.is_none())
                .map(|(i, _)| i)
                .ok_or_else(|| ConfigError::NoFreeSlot(a.to_string()))?
        } else {
            b_slot
        };

        let link = LinkId(self.links.len());
        let a_end = IntfId { node: a_id, slot: a_slot };
        let b_end = IntfId { node: b_id, slot: b_slot };
        self.nodes[a_id.0].intfs[a_slot] = Some(Interface {
            name: a_intf.to_string(),
            id: a_end,
            link,
            prop: IntfProp::Unconfigured,
        });
        self.nodes[b_id.0].intfs[b_slot] = Some(Interface {
            name: b_intf.to_string(),
            id: b_end,
            link,
            prop: IntfProp::Unconfigured,
        });
        self.links.push(Link::new(a_end, b_end, cost));
        debug!(%a, %a_intf, %b, %b_intf, cost, "添加链路");
        Ok(link)
    }

    fn check_new_intf(&self, node: NodeId, intf: &str) -> Result<usize, ConfigError> {
        let n = &self.nodes[node.0];
        if intf.len() > MAX_INTF_NAME_LEN {
            return Err(ConfigError::IntfNameTooLong {
                node: n.name.clone(),
                len: intf.len(),
                max: MAX_INTF_NAME_LEN,
            });
        }
        if n.intf_by_name(intf).is_some() {
            return Err(ConfigError::DuplicateInterface {
                node: n.name.clone(),
                intf: intf.to_string(),
            });
        }
        n.free_slot()
            .ok_or_else(|| ConfigError::NoFreeSlot(n.name.clone()))
    }

    /// 设置节点回环地址
    pub fn set_loopback(&mut self, node: &str, addr: &str) -> Result<(), ConfigError> {
        if addr.trim().is_empty() {
            return Err(ConfigError::EmptyLoopback(node.to_string()));
        }
        let ip = parse_ip(addr)?;
        let n = self.node_by_name_mut(node)?;
        n.loopback = Some(ip);
        info!(node = %n.name, lo = %ip, "设置回环地址");
        Ok(())
    }

    fn intf_mut(&mut self, node: &str, intf: &str) -> Result<&mut Interface, ConfigError> {
        self.node_by_name_mut(node)?
            .intf_by_name_mut(intf)
            .ok_or_else(|| ConfigError::NoSuchInterface {
                node: node.to_string(),
                intf: intf.to_string(),
            })
    }

    /// 为接口配置 IP 与前缀，同时生成 MAC；原有的 L2 配置被清除
    pub fn set_intf_ip(
        &mut self,
        node: &str,
        intf: &str,
        addr: &str,
        prefix_len: u8,
    ) -> Result<MacAddr, ConfigError> {
        if prefix_len > 32 {
            return Err(ConfigError::InvalidPrefix(prefix_len));
        }
        let ip = parse_ip(addr)?;
        let i = self.intf_mut(node, intf)?;
        let mac = MacAddr::random();
        i.prop = IntfProp::L3 { ip, prefix_len, mac };
        info!(%node, %intf, %ip, prefix_len, %mac, "配置接口地址");
        Ok(mac)
    }

    /// 清除接口配置，二层模式和 VLAN 也一并清除
    pub fn unset_intf_ip(&mut self, node: &str, intf: &str) -> Result<(), ConfigError> {
        let i = self.intf_mut(node, intf)?;
        i.prop = IntfProp::Unconfigured;
        debug!(%node, %intf, "清除接口配置");
        Ok(())
    }

    /// 设置二层模式；已有 IP 会被清除
    pub fn set_intf_l2_mode(&mut self, node: &str, intf: &str, mode: L2Mode) -> Result<(), ConfigError> {
        let i = self.intf_mut(node, intf)?;
        let mut vlans = match std::mem::take(&mut i.prop) {
            IntfProp::L2 { vlans, .. } => vlans,
            _ => Vec::new(),
        };
        if mode == L2Mode::Access {
            vlans.truncate(1);
        }
        i.prop = IntfProp::L2 { mode, vlans };
        debug!(%node, %intf, ?mode, "设置二层模式");
        Ok(())
    }

    /// 设置 VLAN 成员；access 覆盖唯一槽位，trunk 追加到上限
    pub fn set_intf_vlan(&mut self, node: &str, intf: &str, vlan: u16) -> Result<(), ConfigError> {
        if vlan == 0 || vlan > 4095 {
            return Err(ConfigError::InvalidVlan(vlan));
        }
        let i = self.intf_mut(node, intf)?;
        match &mut i.prop {
            IntfProp::L3 { .. } => Err(ConfigError::L3ModeConflict {
                node: node.to_string(),
                intf: intf.to_string(),
            }),
            IntfProp::Unconfigured => Err(ConfigError::L2ModeUnset {
                node: node.to_string(),
                intf: intf.to_string(),
            }),
            IntfProp::L2 {
                mode: L2Mode::Access,
                vlans,
            } => {
                vlans.clear();
                vlans.push(vlan);
                Ok(())
            }
            IntfProp::L2 {
                mode: L2Mode::Trunk,
                vlans,
            } => {
                if vlans.contains(&vlan) {
                    return Ok(());
                }
                if vlans.len() >= MAX_VLAN_MEMBERSHIP {
                    return Err(ConfigError::VlanLimit {
                        node: node.to_string(),
                        intf: intf.to_string(),
                        max: MAX_VLAN_MEMBERSHIP,
                    });
                }
                vlans.push(vlan);
                Ok(())
            }
        }
    }

    /// 用直连路由初始化每个节点的路由表：回环 /32 + 每个 L3 接口子网
    ///
    /// 可重复调用；已安装的静态路由保留，同前缀的直连路由覆盖它们。
    pub fn init_routing_table(&self) {
        for node in &self.nodes {
            let mut rt = node.routing_table.lock();
            if let Some(lo) = node.loopback {
                rt.upsert(RouteEntry::direct(lo, 32));
            }
            for (ip, prefix_len) in node.interfaces().filter_map(Interface::ip) {
                rt.upsert(RouteEntry::direct(apply_mask(ip, prefix_len), prefix_len));
            }
            debug!(node = %node.name, routes = rt.len(), "初始化路由表");
        }
    }

    /// 安装静态路由；同一 (dst, prefix) 原地覆盖
    pub fn install_route(
        &self,
        node: &str,
        dst: &str,
        prefix_len: u8,
        gateway: &str,
        out_intf: &str,
    ) -> Result<(), ConfigError> {
        if prefix_len > 32 {
            return Err(ConfigError::InvalidPrefix(prefix_len));
        }
        let dst: Ipv4Addr = parse_ip(dst)?;
        let gateway: Ipv4Addr = parse_ip(gateway)?;
        let n = self.node_by_name(node)?;
        if n.intf_by_name(out_intf).is_none() {
            return Err(ConfigError::NoSuchInterface {
                node: node.to_string(),
                intf: out_intf.to_string(),
            });
        }
        n.routing_table
            .lock()
            .upsert(RouteEntry::via(dst, prefix_len, gateway, out_intf));
        info!(%node, %dst, prefix_len, %gateway, %out_intf, "安装静态路由");
        Ok(())
    }
}
