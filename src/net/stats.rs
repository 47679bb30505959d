//! 统计信息
//!
//! 每个节点的收发计数，接收任务与调用方并发更新。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 节点统计信息
#[derive(Debug, Default)]
pub struct NodeStats {
    pub rx_datagrams: AtomicU64,
    /// 被 L2 校验拒绝的帧
    pub rx_rejected: AtomicU64,
    pub switched_frames: AtomicU64,
    pub forwarded_packets: AtomicU64,
    pub dropped_packets: AtomicU64,
}

/// 某一时刻的统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStatsSnapshot {
    pub rx_datagrams: u64,
    pub rx_rejected: u64,
    pub switched_frames: u64,
    pub forwarded_packets: u64,
    pub dropped_packets: u64,
}

impl NodeStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> NodeStatsSnapshot {
        NodeStatsSnapshot {
            rx_datagrams: self.rx_datagrams.load(Ordering::Relaxed),
            rx_rejected: self.rx_rejected.load(Ordering::Relaxed),
            switched_frames: self.switched_frames.load(Ordering::Relaxed),
            forwarded_packets: self.forwarded_packets.load(Ordering::Relaxed),
            dropped_packets: self.dropped_packets.load(Ordering::Relaxed),
        }
    }
}
