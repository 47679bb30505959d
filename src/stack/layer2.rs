//! 二层：帧校验、上送与学习网桥
//!
//! L3 接口只接收未打标签且目的 MAC 为本接口或广播的帧；
//! L2 接口按 access/trunk 规则处理 VLAN 标签后进入学习网桥。

use tracing::{debug, trace};

use super::frame::{EtherType, EthernetFrame};
use super::network::Network;
use crate::net::{IntfProp, Interface, L2Mode, MacEntry, NodeStats};

/// 入方向校验；接受时返回（可能已打上端口 VLAN 的）帧
pub fn valid_l2_intf(intf: &Interface, frame: EthernetFrame) -> Option<EthernetFrame> {
    match &intf.prop {
        IntfProp::Unconfigured => None,
        IntfProp::L3 { mac, .. } => {
            let for_us = frame.dst == *mac || frame.dst.is_broadcast();
            (frame.vlan.is_none() && for_us).then_some(frame)
        }
        IntfProp::L2 {
            mode: L2Mode::Access,
            ..
        } => match (frame.vlan, intf.access_vlan()) {
            (None, Some(port_vlan)) => Some(frame.tagged(port_vlan)),
            (Some(tag), Some(port_vlan)) if tag == port_vlan => Some(frame),
            _ => None,
        },
        IntfProp::L2 {
            mode: L2Mode::Trunk,
            vlans,
        } => match frame.vlan {
            Some(tag) if vlans.contains(&tag) => Some(frame),
            _ => None,
        },
    }
}

/// 出方向规则；返回 None 表示该端口跳过
pub fn l2_egress(intf: &Interface, frame: &EthernetFrame) -> Option<EthernetFrame> {
    match intf.l2_mode()? {
        L2Mode::Access => match (frame.vlan, intf.access_vlan()) {
            (Some(tag), Some(port_vlan)) if tag == port_vlan => Some(frame.clone().untagged()),
            (None, None) => Some(frame.clone()),
            _ => None,
        },
        L2Mode::Trunk => match frame.vlan {
            Some(tag) if intf.is_vlan_member(tag) => Some(frame.clone()),
            _ => None,
        },
    }
}

impl Network {
    /// 二层入口：校验后上送三层或交给学习网桥
    #[tracing::instrument(skip(self, intf, frame), fields(node = intf.node().0, intf = %intf.name))]
    pub(crate) fn layer2_frame_receive(&self, intf: &Interface, frame: EthernetFrame) {
        let Some(node) = self.node_at(intf.node()) else {
            return;
        };
        let Some(frame) = valid_l2_intf(intf, frame) else {
            NodeStats::bump(&node.stats.rx_rejected);
            trace!("L2 校验拒绝该帧");
            return;
        };

        if intf.is_l3() {
            match frame.ether_type {
                EtherType::Arp => self.process_arp_frame(intf, &frame),
                EtherType::Ip => self.promote_to_layer3(intf, &frame),
                EtherType::Other(code) => debug!(code, "未知的以太网类型，丢弃"),
            }
        } else {
            self.l2switch_receive_frame(intf, frame);
        }
    }

    /// 学习网桥：先学习源 MAC，再广播泛洪、已知单播转发、未知单播泛洪
    fn l2switch_receive_frame(&self, ingress: &Interface, frame: EthernetFrame) {
        let Some(node) = self.node_at(ingress.node()) else {
            return;
        };
        let learned = node.mac_table.lock().insert(MacEntry {
            mac: frame.src,
            intf: ingress.name.clone(),
        });
        if learned {
            debug!(mac = %frame.src, intf = %ingress.name, "学习 MAC 地址");
        }
        NodeStats::bump(&node.stats.switched_frames);

        if frame.dst.is_broadcast() {
            self.l2switch_flood(ingress, &frame);
            return;
        }
        let known = node.mac_table.lock().lookup(frame.dst).map(|e| e.intf.clone());
        match known.as_deref().and_then(|name| node.intf_by_name(name)) {
            Some(out) if out.id == ingress.id => trace!("目的 MAC 位于入接口，丢弃"),
            Some(out) => self.l2switch_send_out(out, &frame),
            None => self.l2switch_flood(ingress, &frame),
        }
    }

    fn l2switch_flood(&self, ingress: &Interface, frame: &EthernetFrame) {
        let Some(node) = self.node_at(ingress.node()) else {
            return;
        };
        for out in node.interfaces().filter(|i| i.id != ingress.id) {
            self.l2switch_send_out(out, frame);
        }
    }

    fn l2switch_send_out(&self, out: &Interface, frame: &EthernetFrame) {
        match l2_egress(out, frame) {
            Some(f) => {
                // 失败已在发送路径记录
                let _ = self.send_frame(out.id, &f);
            }
            None => trace!(intf = %out.name, "出端口 VLAN 不匹配，跳过"),
        }
    }
}
