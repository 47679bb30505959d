//! ARP 子系统
//!
//! 广播请求、应答、缓存更新，以及带重试的解析：同一 (节点, IP) 同时只有一个
//! 解析在进行，期间到达的报文和等待者都挂在同一个条目上。

use std::collections::hash_map::Entry;
use std::net::Ipv4Addr;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::event::StackEvent;
use super::frame::{ArpOp, ArpPacket, EtherType, EthernetFrame};
use super::network::Network;
use crate::error::{ConfigError, StackError};
use crate::net::{ArpEntry, IntfId, Interface, MacAddr, NodeId, NodeStats};

/// 解析完成前挂起的内容
pub(crate) enum Pending {
    /// 目的 MAC 待填的 IP 帧
    Packet(EthernetFrame),
    Waiter(oneshot::Sender<MacAddr>),
}

pub(crate) struct PendingResolution {
    out: IntfId,
    packets: Vec<EthernetFrame>,
    waiters: Vec<oneshot::Sender<MacAddr>>,
}

impl PendingResolution {
    fn new(out: IntfId) -> Self {
        Self {
            out,
            packets: Vec::new(),
            waiters: Vec::new(),
        }
    }

    fn push(&mut self, item: Pending) {
        match item {
            Pending::Packet(frame) => self.packets.push(frame),
            Pending::Waiter(tx) => self.waiters.push(tx),
        }
    }
}

impl Network {
    /// 发送 ARP 广播请求
    ///
    /// 未指定出接口时使用子网包含 `ip` 的接口；没有则返回配置错误。
    #[tracing::instrument(skip(self))]
    pub fn send_arp_broadcast(&self, node: &str, out_intf: Option<&str>, ip: Ipv4Addr) -> Result<(), StackError> {
        let n = self.node(node)?;
        let intf = match out_intf {
            Some(name) => n.intf_by_name(name).ok_or_else(|| ConfigError::NoSuchInterface {
                node: node.to_string(),
                intf: name.to_string(),
            })?,
            None => n.matching_subnet(ip).ok_or_else(|| ConfigError::NoMatchingSubnet {
                node: node.to_string(),
                ip,
            })?,
        };
        self.send_arp_request(intf, ip)
    }

    fn send_arp_request(&self, intf: &Interface, ip: Ipv4Addr) -> Result<(), StackError> {
        let node_name = || {
            self.node_at(intf.node())
                .map(|n| n.name.clone())
                .unwrap_or_default()
        };
        let (Some((src_ip, _)), Some(mac)) = (intf.ip(), intf.mac()) else {
            return Err(ConfigError::NotL3 {
                node: node_name(),
                intf: intf.name.clone(),
            }
            .into());
        };
        let req = ArpPacket::request(mac, src_ip, ip);
        let frame = EthernetFrame::new(MacAddr::BROADCAST, mac, EtherType::Arp, &req.to_bytes())?;
        debug!(intf = %intf.name, target = %ip, "📢 发送 ARP 请求");
        self.send_frame(intf.id, &frame)?;
        Ok(())
    }

    /// "resolve-arp all"：对每个 L3 接口的对端地址发请求，返回发出的请求数
    pub fn resolve_arp_all(&self, node: &str) -> Result<usize, StackError> {
        let n = self.node(node)?;
        let mut sent = 0;
        for intf in n.interfaces().filter(|i| i.is_l3()) {
            let Some((nbr_ip, _)) = self.graph.nbr(intf.id).and_then(Interface::ip) else {
                continue;
            };
            self.send_arp_request(intf, nbr_ip)?;
            sent += 1;
        }
        Ok(sent)
    }

    #[tracing::instrument(skip(self, intf, frame), fields(node = intf.node().0, intf = %intf.name))]
    pub(crate) fn process_arp_frame(&self, intf: &Interface, frame: &EthernetFrame) {
        let pkt = match ArpPacket::from_bytes(&frame.payload) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "无法解析 ARP 报文");
                return;
            }
        };
        let Some(node) = self.node_at(intf.node()) else {
            return;
        };
        match pkt.op {
            ArpOp::Request => {
                self.emit(StackEvent::ArpRequestReceived {
                    node: node.name.clone(),
                    intf: intf.name.clone(),
                    sender_ip: pkt.sender_ip,
                    target_ip: pkt.target_ip,
                });
                let (Some((ip, _)), Some(mac)) = (intf.ip(), intf.mac()) else {
                    return;
                };
                if pkt.target_ip != ip {
                    debug!(target = %pkt.target_ip, "ARP 请求不是发给本接口的，忽略");
                    return;
                }
                let reply = ArpPacket::reply(&pkt, mac);
                let sent = EthernetFrame::new(pkt.sender_mac, mac, EtherType::Arp, &reply.to_bytes())
                    .map_err(StackError::from)
                    .and_then(|f| self.send_frame(intf.id, &f).map_err(StackError::from));
                match sent {
                    Ok(()) => debug!(to = %pkt.sender_ip, "📨 发送 ARP 应答"),
                    Err(e) => warn!(error = %e, "ARP 应答发送失败"),
                }
            }
            ArpOp::Reply => {
                let inserted = node.arp_table.lock().insert(ArpEntry {
                    ip: pkt.sender_ip,
                    mac: pkt.sender_mac,
                    intf: intf.name.clone(),
                });
                if inserted {
                    info!(ip = %pkt.sender_ip, mac = %pkt.sender_mac, "ARP 表项已更新");
                }
                self.emit(StackEvent::ArpResolved {
                    node: node.name.clone(),
                    intf: intf.name.clone(),
                    ip: pkt.sender_ip,
                    mac: pkt.sender_mac,
                });
                self.complete_resolution(node.id, pkt.sender_ip, pkt.sender_mac);
            }
        }
    }

    /// 解析完成：补上目的 MAC 发出挂起的报文并通知等待者
    fn complete_resolution(&self, node: NodeId, ip: Ipv4Addr, mac: MacAddr) {
        let Some(p) = self.pending.lock().remove(&(node, ip)) else {
            return;
        };
        debug!(%ip, packets = p.packets.len(), waiters = p.waiters.len(), "ARP 解析完成");
        for mut frame in p.packets {
            frame.dst = mac;
            let _ = self.send_frame(p.out, &frame);
        }
        for tx in p.waiters {
            let _ = tx.send(mac);
        }
    }

    /// ARP 未命中：挂起 `item`，只有第一次未命中才发请求并启动重试定时器
    pub(crate) fn arp_miss(&self, out: IntfId, next_hop: Ipv4Addr, item: Pending) -> Result<(), StackError> {
        let first = {
            let mut pending = self.pending.lock();
            match pending.entry((out.node, next_hop)) {
                Entry::Occupied(mut e) => {
                    e.get_mut().push(item);
                    false
                }
                Entry::Vacant(e) => {
                    e.insert(PendingResolution::new(out)).push(item);
                    true
                }
            }
        };
        if !first {
            debug!(%next_hop, "ARP 解析已在进行，排队等待");
            return Ok(());
        }
        let Some(intf) = self.graph.intf(out) else {
            self.pending.lock().remove(&(out.node, next_hop));
            return Ok(());
        };
        if let Err(e) = self.send_arp_request(intf, next_hop) {
            self.pending.lock().remove(&(out.node, next_hop));
            return Err(e);
        }
        self.spawn_arp_timer(out.node, next_hop);
        Ok(())
    }

    fn spawn_arp_timer(&self, node: NodeId, ip: Ipv4Addr) {
        let weak = self.this.clone();
        let delay = self.config.arp_retry_delay;
        let retries = self.config.arp_retries;
        self.runtime.spawn(async move {
            for attempt in 0..=retries {
                tokio::time::sleep(delay).await;
                let Some(net) = weak.upgrade() else {
                    return;
                };
                let out = match net.pending.lock().get(&(node, ip)) {
                    Some(p) => p.out,
                    None => return,
                };
                if attempt < retries {
                    debug!(%ip, attempt = attempt + 1, "ARP 未应答，重发请求");
                    if let Some(intf) = net.graph.intf(out) {
                        if let Err(e) = net.send_arp_request(intf, ip) {
                            warn!(error = %e, "ARP 重发失败");
                        }
                    }
                } else {
                    net.abandon_resolution(node, ip);
                }
            }
        });
    }

    /// 重试用尽：丢弃挂起的报文，等待者收到解析失败
    fn abandon_resolution(&self, node: NodeId, ip: Ipv4Addr) {
        let Some(p) = self.pending.lock().remove(&(node, ip)) else {
            return;
        };
        let Some(n) = self.node_at(node) else {
            return;
        };
        warn!(node = %n.name, %ip, dropped = p.packets.len(), "ARP 解析失败，丢弃报文");
        for _ in &p.packets {
            NodeStats::bump(&n.stats.dropped_packets);
            self.emit(StackEvent::PacketDropped {
                node: n.name.clone(),
                dst: ip,
                reason: "arp unresolved".to_string(),
            });
        }
    }

    /// 解析 `ip` 的 MAC；缓存命中立即返回，否则等待带重试的解析结果
    pub async fn resolve(&self, node: &str, ip: Ipv4Addr) -> Result<MacAddr, StackError> {
        let n = self.node(node)?;
        if let Some(e) = n.arp_table.lock().lookup(ip) {
            return Ok(e.mac);
        }
        let out = n
            .matching_subnet(ip)
            .ok_or_else(|| ConfigError::NoMatchingSubnet {
                node: node.to_string(),
                ip,
            })?
            .id;
        let (tx, rx) = oneshot::channel();
        self.arp_miss(out, ip, Pending::Waiter(tx))?;
        rx.await.map_err(|_| StackError::ArpUnresolved {
            node: node.to_string(),
            ip,
        })
    }
}
