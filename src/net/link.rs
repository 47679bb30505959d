//! 链路类型
//!
//! 点对点链路，连接两个接口，创建后不可变。

use super::id::IntfId;

/// 网络链路
#[derive(Debug, Clone)]
pub struct Link {
    pub ends: [IntfId; 2],
    pub cost: u32,
}

impl Link {
    /// 创建新链路
    pub fn new(a: IntfId, b: IntfId, cost: u32) -> Self {
        Self { ends: [a, b], cost }
    }

    /// 返回链路另一端的接口
    pub fn other_end(&self, this: IntfId) -> IntfId {
        if self.ends[0] == this {
            self.ends[1]
        } else {
            self.ends[0]
        }
    }
}
