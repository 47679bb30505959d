//! 地址类型
//!
//! MAC 地址、IPv4 掩码运算以及 CIDR 解析。

use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

use rand::Rng;
use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// 以太网 MAC 地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);
    pub const ZERO: MacAddr = MacAddr([0; 6]);

    /// 随机生成一个单播 MAC 地址
    pub fn random() -> Self {
        let mut bytes = [0u8; 6];
        rand::thread_rng().fill(&mut bytes);
        // 单播 + 本地管理位，永远不会与广播地址冲突
        bytes[0] = (bytes[0] & 0xfe) | 0x02;
        MacAddr(bytes)
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl Display for MacAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 前缀长度对应的 32 位掩码
pub fn mask_of(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

/// 对 IP 应用前缀掩码，得到网络地址
pub fn apply_mask(ip: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) & mask_of(prefix_len))
}

/// 解析点分十进制 IPv4 地址
pub fn parse_ip(s: &str) -> Result<Ipv4Addr, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(s.to_string()))
}

/// `a.b.c.d/len` 形式的地址；缺省前缀视为 /32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Cidr {
    pub fn network(&self) -> Ipv4Addr {
        apply_mask(self.address, self.prefix_len)
    }
}

impl Display for Ipv4Cidr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        let address = parse_ip(parts.next().unwrap_or_default())?;
        let prefix_len: u8 = match parts.next() {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::InvalidCidr(s.to_string()))?,
            None => 32,
        };
        if prefix_len > 32 {
            return Err(ConfigError::InvalidPrefix(prefix_len));
        }
        if parts.next().is_some() {
            return Err(ConfigError::InvalidCidr(s.to_string()));
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }
}
