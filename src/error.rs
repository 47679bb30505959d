//! 错误类型
//!
//! 按来源划分：拓扑配置、线路编解码、传输层、协议栈运行期错误。

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// 拓扑/地址配置错误，出错时拓扑保持不变。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no node named `{0}`")]
    NoSuchNode(String),
    #[error("node `{0}` already exists")]
    DuplicateNode(String),
    #[error("node `{node}` has no interface named `{intf}`")]
    NoSuchInterface { node: String, intf: String },
    #[error("interface `{intf}` already exists on node `{node}`")]
    DuplicateInterface { node: String, intf: String },
    #[error("interface name on node `{node}` is {len} bytes, max {max}")]
    IntfNameTooLong { node: String, len: usize, max: usize },
    #[error("no available interface slot on node `{0}`")]
    NoFreeSlot(String),
    #[error("empty loopback address for node `{0}`")]
    EmptyLoopback(String),
    #[error("invalid IPv4 address `{0}`")]
    InvalidAddress(String),
    #[error("invalid prefix length {0}")]
    InvalidPrefix(u8),
    #[error("invalid CIDR `{0}`")]
    InvalidCidr(String),
    #[error("invalid vlan id {0}")]
    InvalidVlan(u16),
    #[error("interface {node}:{intf} configured with L3 mode, can't assign vlan membership")]
    L3ModeConflict { node: String, intf: String },
    #[error("L2 mode is not set on interface {node}:{intf}")]
    L2ModeUnset { node: String, intf: String },
    #[error("max of {max} vlans are set on interface {node}:{intf}")]
    VlanLimit {
        node: String,
        intf: String,
        max: usize,
    },
    #[error("interface {node}:{intf} has no IP address")]
    NotL3 { node: String, intf: String },
    #[error("no outgoing interface and no matching subnet on node `{node}` for {ip}")]
    NoMatchingSubnet { node: String, ip: Ipv4Addr },
}

/// 线路记录编解码错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("truncated {what}: need {need} bytes, got {got}")]
    Truncated {
        what: &'static str,
        need: usize,
        got: usize,
    },
    #[error("interface name is not valid utf-8")]
    BadName,
    #[error("interface name too long ({0} bytes)")]
    NameTooLong(usize),
    #[error("payload of {0} bytes exceeds frame capacity")]
    PayloadTooLarge(usize),
    #[error("unknown ARP operation {0}")]
    UnknownArpOp(u16),
}

/// 传输层（回环 UDP 线路仿真）错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("can't bind udp endpoint {addr} for node `{node}`")]
    Bind {
        node: String,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("node `{0}` has no bound endpoint")]
    Unbound(String),
    #[error("can't send datagram to node `{node}` at {addr}")]
    Send {
        node: String,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// 协议栈运行期错误
#[derive(Debug, Error)]
pub enum StackError {
    #[error("no route on node `{node}` for {dst}")]
    NoRoute { node: String, dst: Ipv4Addr },
    #[error("max TTL reached on node `{node}` for {dst}")]
    TtlExceeded { node: String, dst: Ipv4Addr },
    #[error("ARP for {ip} unresolved on node `{node}`")]
    ArpUnresolved { node: String, ip: Ipv4Addr },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
