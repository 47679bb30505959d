//! 协议栈结构化事件
//!
//! 通过 broadcast 通道发布，订阅方可以输出 JSON 行或在测试中断言。

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::net::MacAddr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StackEvent {
    /// ICMP 报文在目的节点本地交付
    PingSuccessful {
        node: String,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        ttl: u8,
    },
    ArpRequestReceived {
        node: String,
        intf: String,
        sender_ip: Ipv4Addr,
        target_ip: Ipv4Addr,
    },
    ArpResolved {
        node: String,
        intf: String,
        ip: Ipv4Addr,
        mac: MacAddr,
    },
    /// 转发前 TTL 已减一
    Forwarded {
        node: String,
        dst: Ipv4Addr,
        ttl: u8,
    },
    PacketDropped {
        node: String,
        dst: Ipv4Addr,
        reason: String,
    },
}
