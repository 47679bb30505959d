//! ARP 表与 MAC 表
//!
//! 两张表都用有序 Vec 存储，插入顺序即展示顺序；键唯一。

use std::net::Ipv4Addr;

use super::addr::MacAddr;

/// ARP 表项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// 解析该地址的接口
    pub intf: String,
}

#[derive(Debug, Default, Clone)]
pub struct ArpTable {
    entries: Vec<ArpEntry>,
}

impl ArpTable {
    /// 插入表项；同 IP 同 MAC 时不变，返回 false。
    /// 同 IP 不同 MAC 时先删后插。
    pub fn insert(&mut self, entry: ArpEntry) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.ip == entry.ip) {
            if self.entries[pos].mac == entry.mac {
                return false;
            }
            self.entries.remove(pos);
        }
        self.entries.push(entry);
        true
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<&ArpEntry> {
        self.entries.iter().find(|e| e.ip == ip)
    }

    pub fn delete(&mut self, ip: Ipv4Addr) -> Option<ArpEntry> {
        let pos = self.entries.iter().position(|e| e.ip == ip)?;
        Some(self.entries.remove(pos))
    }

    pub fn entries(&self) -> &[ArpEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// MAC 学习表项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacEntry {
    pub mac: MacAddr,
    pub intf: String,
}

#[derive(Debug, Default, Clone)]
pub struct MacTable {
    entries: Vec<MacEntry>,
}

impl MacTable {
    /// 学习 `mac` 所在接口，语义同 [`ArpTable::insert`]
    pub fn insert(&mut self, entry: MacEntry) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.mac == entry.mac) {
            if self.entries[pos].intf == entry.intf {
                return false;
            }
            self.entries.remove(pos);
        }
        self.entries.push(entry);
        true
    }

    pub fn lookup(&self, mac: MacAddr) -> Option<&MacEntry> {
        self.entries.iter().find(|e| e.mac == mac)
    }

    pub fn delete(&mut self, mac: MacAddr) -> Option<MacEntry> {
        let pos = self.entries.iter().position(|e| e.mac == mac)?;
        Some(self.entries.remove(pos))
    }

    pub fn entries(&self) -> &[MacEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
