//! 三层：路由查找、TTL、本地交付与下行到二层
//!
//! 转发路径上每一跳（直连非本地或经网关）TTL 减一；
//! 源节点发出和本地交付时不减。

use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use super::arp::Pending;
use super::event::StackEvent;
use super::frame::{EtherType, EthernetFrame, IpHeader};
use super::network::Network;
use crate::error::{ConfigError, StackError};
use crate::net::{Interface, MacAddr, Node, NodeId, NodeStats};

impl Network {
    /// IP 帧上送：解析头部后进入路由
    pub(crate) fn promote_to_layer3(&self, intf: &Interface, frame: &EthernetFrame) {
        let hdr = match IpHeader::from_bytes(&frame.payload) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "无法解析 IP 头部");
                return;
            }
        };
        if let Err(e) = self.l3_receive_frame(intf.node(), hdr) {
            self.report_drop(intf.node(), hdr.dst, &e);
        }
    }

    pub(crate) fn report_drop(&self, node: NodeId, dst: Ipv4Addr, err: &StackError) {
        let Some(n) = self.node_at(node) else {
            return;
        };
        warn!(node = %n.name, %dst, error = %err, "🗑️ 丢弃报文");
        NodeStats::bump(&n.stats.dropped_packets);
        self.emit(StackEvent::PacketDropped {
            node: n.name.clone(),
            dst,
            reason: err.to_string(),
        });
    }

    /// 收到的 IP 报文：本地交付，或减 TTL 后转发
    #[tracing::instrument(skip(self, hdr), fields(node = node.0, src = %hdr.src, dst = %hdr.dst, ttl = hdr.ttl))]
    pub(crate) fn l3_receive_frame(&self, node: NodeId, mut hdr: IpHeader) -> Result<(), StackError> {
        let n = self.node_at(node).ok_or_else(|| ConfigError::NoSuchNode(format!("node#{}", node.0)))?;
        let route = n
            .routing_table
            .lock()
            .lookup(hdr.dst)
            .cloned()
            .ok_or_else(|| StackError::NoRoute {
                node: n.name.clone(),
                dst: hdr.dst,
            })?;

        if route.is_direct && n.is_local_address(hdr.dst) {
            self.local_deliver(n, &hdr);
            return Ok(());
        }

        if hdr.ttl <= 1 {
            return Err(StackError::TtlExceeded {
                node: n.name.clone(),
                dst: hdr.dst,
            });
        }
        hdr.ttl -= 1;
        NodeStats::bump(&n.stats.forwarded_packets);
        debug!(ttl = hdr.ttl, "🚀 转发 IP 报文");
        self.emit(StackEvent::Forwarded {
            node: n.name.clone(),
            dst: hdr.dst,
            ttl: hdr.ttl,
        });

        match (route.is_direct, route.gateway) {
            (false, Some(gw)) => self.demote_to_layer2(n, route.out_intf.as_deref(), gw, hdr),
            _ => self.demote_to_layer2(n, None, hdr.dst, hdr),
        }
    }

    fn local_deliver(&self, node: &Node, hdr: &IpHeader) {
        if hdr.protocol != IpHeader::PROTO_ICMP {
            debug!(protocol = hdr.protocol, "未知协议，丢弃");
            return;
        }
        info!(node = %node.name, "✅ Ip Addr: {} ping successful", hdr.dst);
        self.emit(StackEvent::PingSuccessful {
            node: node.name.clone(),
            src: hdr.src,
            dst: hdr.dst,
            ttl: hdr.ttl,
        });
    }

    /// 源节点发出 IP 报文：选源地址，查路由后下行，TTL 不变
    #[tracing::instrument(skip(self))]
    pub(crate) fn demote_to_layer3(&self, node: &str, dst: Ipv4Addr, protocol: u8) -> Result<(), StackError> {
        let n = self.node(node)?;
        let route = n
            .routing_table
            .lock()
            .lookup(dst)
            .cloned()
            .ok_or_else(|| StackError::NoRoute {
                node: n.name.clone(),
                dst,
            })?;
        let (out_intf, next_hop) = match (route.is_direct, route.gateway) {
            (false, Some(gw)) => (route.out_intf.as_deref(), gw),
            _ => (None, dst),
        };
        let src = n
            .loopback
            .or_else(|| {
                out_intf
                    .and_then(|name| n.intf_by_name(name))
                    .or_else(|| n.matching_subnet(next_hop))
                    .and_then(Interface::ip)
                    .map(|(ip, _)| ip)
            })
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        let hdr = IpHeader::new(src, dst, protocol);
        if n.is_local_address(dst) {
            self.local_deliver(n, &hdr);
            return Ok(());
        }
        self.demote_to_layer2(n, out_intf, next_hop, hdr)
    }

    /// 下行到二层：选出接口，ARP 命中则发送，否则挂起等待解析
    fn demote_to_layer2(
        &self,
        node: &Node,
        out_intf: Option<&str>,
        next_hop: Ipv4Addr,
        hdr: IpHeader,
    ) -> Result<(), StackError> {
        if node.is_local_address(next_hop) {
            return self.l3_receive_frame(node.id, hdr);
        }
        let intf = match out_intf {
            Some(name) => node.intf_by_name(name).ok_or_else(|| ConfigError::NoSuchInterface {
                node: node.name.clone(),
                intf: name.to_string(),
            })?,
            None => node.matching_subnet(next_hop).ok_or_else(|| ConfigError::NoMatchingSubnet {
                node: node.name.clone(),
                ip: next_hop,
            })?,
        };
        let Some(src_mac) = intf.mac() else {
            return Err(ConfigError::NotL3 {
                node: node.name.clone(),
                intf: intf.name.clone(),
            }
            .into());
        };
        let mut frame = EthernetFrame::new(MacAddr::ZERO, src_mac, EtherType::Ip, &hdr.to_bytes())?;

        let hit = node.arp_table.lock().lookup(next_hop).map(|e| e.mac);
        match hit {
            Some(mac) => {
                frame.dst = mac;
                self.send_frame(intf.id, &frame)?;
                Ok(())
            }
            None => {
                debug!(%next_hop, intf = %intf.name, "ARP 未命中，发起解析");
                self.arp_miss(intf.id, next_hop, Pending::Packet(frame))
            }
        }
    }
}
