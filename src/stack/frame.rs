//! 帧与报文编解码
//!
//! 线路记录 = 出接口名 + 以太网帧；以太网帧承载定长的 ARP 或 IP 负载。
//! 所有多字节字段使用网络字节序。

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::CodecError;
use crate::net::MacAddr;

/// 以太网帧负载区大小（定长）
pub const ETH_PAYLOAD_LEN: usize = 500;
pub const ETH_FCS_LEN: usize = 4;
pub const VLAN_TPID: u16 = 0x8100;

/// 以太网类型字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Arp,
    Ip,
    Other(u16),
}

impl EtherType {
    pub const ARP_CODE: u16 = 0x0326;
    pub const IP_CODE: u16 = 0x0800;

    pub fn code(self) -> u16 {
        match self {
            EtherType::Arp => Self::ARP_CODE,
            EtherType::Ip => Self::IP_CODE,
            EtherType::Other(c) => c,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            Self::ARP_CODE => EtherType::Arp,
            Self::IP_CODE => EtherType::Ip,
            c => EtherType::Other(c),
        }
    }
}

fn need(what: &'static str, buf: &[u8], n: usize) -> Result<(), CodecError> {
    if buf.len() < n {
        return Err(CodecError::Truncated {
            what,
            need: n,
            got: buf.len(),
        });
    }
    Ok(())
}

fn be16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

fn mac_at(buf: &[u8], at: usize) -> MacAddr {
    let mut m = [0u8; 6];
    m.copy_from_slice(&buf[at..at + 6]);
    MacAddr(m)
}

fn ip_at(buf: &[u8], at: usize) -> Ipv4Addr {
    Ipv4Addr::new(buf[at], buf[at + 1], buf[at + 2], buf[at + 3])
}

/// 以太网帧，可带一个 802.1Q VLAN 标签
#[derive(Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub vlan: Option<u16>,
    pub ether_type: EtherType,
    pub payload: [u8; ETH_PAYLOAD_LEN],
    /// 不做校验
    pub fcs: u32,
}

impl fmt::Debug for EthernetFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthernetFrame")
            .field("dst", &self.dst)
            .field("src", &self.src)
            .field("vlan", &self.vlan)
            .field("ether_type", &self.ether_type)
            .finish_non_exhaustive()
    }
}

impl EthernetFrame {
    /// 创建未打标签的帧，`body` 拷贝到负载区开头
    pub fn new(dst: MacAddr, src: MacAddr, ether_type: EtherType, body: &[u8]) -> Result<Self, CodecError> {
        if body.len() > ETH_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLarge(body.len()));
        }
        let mut payload = [0u8; ETH_PAYLOAD_LEN];
        payload[..body.len()].copy_from_slice(body);
        Ok(Self {
            dst,
            src,
            vlan: None,
            ether_type,
            payload,
            fcs: 0,
        })
    }

    pub fn tagged(mut self, vlan: u16) -> Self {
        self.vlan = Some(vlan);
        self
    }

    pub fn untagged(mut self) -> Self {
        self.vlan = None;
        self
    }

    pub fn encoded_len(&self) -> usize {
        let tag = if self.vlan.is_some() { 4 } else { 0 };
        12 + tag + 2 + ETH_PAYLOAD_LEN + ETH_FCS_LEN
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.dst.0);
        out.extend_from_slice(&self.src.0);
        if let Some(vlan) = self.vlan {
            out.extend_from_slice(&VLAN_TPID.to_be_bytes());
            out.extend_from_slice(&(vlan & 0x0fff).to_be_bytes());
        }
        out.extend_from_slice(&self.ether_type.code().to_be_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.fcs.to_be_bytes());
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("ethernet header", buf, 14)?;
        let dst = mac_at(buf, 0);
        let src = mac_at(buf, 6);
        let (vlan, type_at) = if be16(buf, 12) == VLAN_TPID {
            need("vlan tag", buf, 18)?;
            (Some(be16(buf, 14) & 0x0fff), 16)
        } else {
            (None, 12)
        };
        let ether_type = EtherType::from_code(be16(buf, type_at));
        let body_at = type_at + 2;
        let total = body_at + ETH_PAYLOAD_LEN + ETH_FCS_LEN;
        need("ethernet frame", buf, total)?;
        let mut payload = [0u8; ETH_PAYLOAD_LEN];
        payload.copy_from_slice(&buf[body_at..body_at + ETH_PAYLOAD_LEN]);
        let fcs_at = body_at + ETH_PAYLOAD_LEN;
        let fcs = u32::from_be_bytes([buf[fcs_at], buf[fcs_at + 1], buf[fcs_at + 2], buf[fcs_at + 3]]);
        Ok(Self {
            dst,
            src,
            vlan,
            ether_type,
            payload,
            fcs,
        })
    }
}

/// 一个 UDP 数据报承载的线路记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    /// 接收端的接口名
    pub intf: String,
    pub frame: EthernetFrame,
}

impl WireRecord {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let name = self.intf.as_bytes();
        let len = u8::try_from(name.len()).map_err(|_| CodecError::NameTooLong(name.len()))?;
        let mut out = Vec::with_capacity(1 + name.len() + self.frame.encoded_len());
        out.push(len);
        out.extend_from_slice(name);
        self.frame.encode(&mut out);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        need("record header", buf, 1)?;
        let len = usize::from(buf[0]);
        need("interface name", buf, 1 + len)?;
        let intf = std::str::from_utf8(&buf[1..1 + len])
            .map_err(|_| CodecError::BadName)?
            .to_string();
        let frame = EthernetFrame::decode(&buf[1 + len..])?;
        Ok(Self { intf, frame })
    }
}

/// ARP 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

/// IPv4 over Ethernet 的 ARP 报文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub op: ArpOp,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    pub const HTYPE_ETHERNET: u16 = 1;
    pub const PTYPE_IPV4: u16 = 0x0800;
    pub const SIZE: usize = 28;

    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            op: ArpOp::Request,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::ZERO,
            target_ip,
        }
    }

    /// 针对 `req` 构造应答，发送方为本接口
    pub fn reply(req: &ArpPacket, mac: MacAddr) -> Self {
        Self {
            op: ArpOp::Reply,
            sender_mac: mac,
            sender_ip: req.target_ip,
            target_mac: req.sender_mac,
            target_ip: req.sender_ip,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut b = [0u8; Self::SIZE];
        b[0..2].copy_from_slice(&Self::HTYPE_ETHERNET.to_be_bytes());
        b[2..4].copy_from_slice(&Self::PTYPE_IPV4.to_be_bytes());
        b[4] = 6;
        b[5] = 4;
        b[6..8].copy_from_slice(&(self.op as u16).to_be_bytes());
        b[8..14].copy_from_slice(&self.sender_mac.0);
        b[14..18].copy_from_slice(&self.sender_ip.octets());
        b[18..24].copy_from_slice(&self.target_mac.0);
        b[24..28].copy_from_slice(&self.target_ip.octets());
        b
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        need("arp packet", buf, Self::SIZE)?;
        let op = match be16(buf, 6) {
            1 => ArpOp::Request,
            2 => ArpOp::Reply,
            other => return Err(CodecError::UnknownArpOp(other)),
        };
        Ok(Self {
            op,
            sender_mac: mac_at(buf, 8),
            sender_ip: ip_at(buf, 14),
            target_mac: mac_at(buf, 18),
            target_ip: ip_at(buf, 24),
        })
    }
}

/// 简化的 IPv4 头部（20 字节，无选项，不计算校验和）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeader {
    pub version: u8,
    pub ihl: u8,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub dont_fragment: bool,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl IpHeader {
    pub const SIZE: usize = 20;
    pub const DEFAULT_TTL: u8 = 64;
    pub const PROTO_ICMP: u8 = 1;

    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8) -> Self {
        Self {
            version: 4,
            ihl: 5,
            tos: 0,
            total_length: Self::SIZE as u16,
            identification: 0,
            dont_fragment: true,
            ttl: Self::DEFAULT_TTL,
            protocol,
            checksum: 0,
            src,
            dst,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut b = [0u8; Self::SIZE];
        b[0] = (self.version << 4) | (self.ihl & 0x0f);
        b[1] = self.tos;
        b[2..4].copy_from_slice(&self.total_length.to_be_bytes());
        b[4..6].copy_from_slice(&self.identification.to_be_bytes());
        let flags: u16 = if self.dont_fragment { 0x4000 } else { 0 };
        b[6..8].copy_from_slice(&flags.to_be_bytes());
        b[8] = self.ttl;
        b[9] = self.protocol;
        b[10..12].copy_from_slice(&self.checksum.to_be_bytes());
        b[12..16].copy_from_slice(&self.src.octets());
        b[16..20].copy_from_slice(&self.dst.octets());
        b
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        need("ip header", buf, Self::SIZE)?;
        Ok(Self {
            version: buf[0] >> 4,
            ihl: buf[0] & 0x0f,
            tos: buf[1],
            total_length: be16(buf, 2),
            identification: be16(buf, 4),
            dont_fragment: be16(buf, 6) & 0x4000 != 0,
            ttl: buf[8],
            protocol: buf[9],
            checksum: be16(buf, 10),
            src: ip_at(buf, 12),
            dst: ip_at(buf, 16),
        })
    }
}
