//! 线路仿真
//!
//! 每个节点一个 UDP 端点。发送时沿链路找到邻居节点的端点，把
//! {邻居接口名, 帧} 编码成一个数据报；接收时解码并交给二层。

use std::io::ErrorKind;
use std::sync::Weak;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, trace, warn};

use super::frame::{EthernetFrame, WireRecord};
use super::network::Network;
use crate::error::TransportError;
use crate::net::{IntfId, NodeId, NodeStats};

/// 接收出错后的退避时间
const RECV_BACKOFF: Duration = Duration::from_millis(10);

/// 对端端口未监听时 ICMP 不可达会反映到接收上，这类错误直接继续
pub(crate) fn is_transient_recv_error(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused | ErrorKind::Interrupted
    )
}

/// 节点的接收循环，网络被释放后退出；其他错误退避后重试
pub(crate) async fn recv_loop(weak: Weak<Network>, node: NodeId, socket: UdpSocket, buf_len: usize) {
    let mut buf = vec![0u8; buf_len];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(e) if is_transient_recv_error(e.kind()) => {
                debug!(node = node.0, error = %e, "忽略接收错误");
                continue;
            }
            Err(e) => {
                warn!(node = node.0, error = %e, "接收数据报失败");
                if weak.strong_count() == 0 {
                    return;
                }
                tokio::time::sleep(RECV_BACKOFF).await;
                continue;
            }
        };
        let Some(net) = weak.upgrade() else {
            return;
        };
        trace!(node = node.0, len, %peer, "收到数据报");
        net.on_datagram(node, &buf[..len]);
    }
}

impl Network {
    fn on_datagram(&self, node: NodeId, bytes: &[u8]) {
        let Some(n) = self.node_at(node) else {
            return;
        };
        NodeStats::bump(&n.stats.rx_datagrams);
        let record = match WireRecord::decode(bytes) {
            Ok(r) => r,
            Err(e) => {
                warn!(node = %n.name, error = %e, "无法解码线路记录");
                return;
            }
        };
        let Some(intf) = n.intf_by_name(&record.intf) else {
            warn!(node = %n.name, intf = %record.intf, "线路记录指向不存在的接口");
            return;
        };
        self.layer2_frame_receive(intf, record.frame);
    }

    /// 从 `out` 发出一帧到链路对端
    ///
    /// 失败在这里记录一次后返回，调用方不再重试。
    #[tracing::instrument(skip(self, frame), fields(node = out.node.0, slot = out.slot))]
    pub(crate) fn send_frame(&self, out: IntfId, frame: &EthernetFrame) -> Result<(), TransportError> {
        let res = self.try_send_frame(out, frame);
        if let Err(e) = &res {
            warn!(error = %e, "发送帧失败");
        }
        res
    }

    fn try_send_frame(&self, out: IntfId, frame: &EthernetFrame) -> Result<(), TransportError> {
        let unbound = || TransportError::Unbound(format!("node#{}", out.node.0));
        let nbr = self.graph.nbr(out).ok_or_else(unbound)?;
        let nbr_node = self.node_at(nbr.node()).ok_or_else(unbound)?;
        let addr = nbr_node
            .endpoint
            .ok_or_else(|| TransportError::Unbound(nbr_node.name.clone()))?;
        let socket = self.senders.get(out.node.0).ok_or_else(unbound)?;
        let record = WireRecord {
            intf: nbr.name.clone(),
            frame: frame.clone(),
        };
        let bytes = record.encode()?;
        socket.send_to(&bytes, addr).map_err(|source| TransportError::Send {
            node: nbr_node.name.clone(),
            addr,
            source,
        })?;
        debug!(to = %nbr_node.name, intf = %nbr.name, len = bytes.len(), "📤 发送帧");
        Ok(())
    }
}
