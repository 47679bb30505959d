//! 应用层：ping

use std::net::Ipv4Addr;

use super::frame::IpHeader;
use super::network::Network;
use crate::error::StackError;

impl Network {
    /// 从 `node` 向 `dst` 发一个 ICMP 报文；只有目的节点报告成功，调用方不等待结果
    pub fn ping(&self, node: &str, dst: Ipv4Addr) -> Result<(), StackError> {
        self.demote_to_layer3(node, dst, IpHeader::PROTO_ICMP)
    }
}
