//! 静态路由表
//!
//! 表项按 (网络地址, 前缀长度) 唯一；查找时做最长前缀匹配。

use std::net::Ipv4Addr;

use super::addr::apply_mask;

/// 路由表项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// 已按前缀掩码处理的目的网络
    pub dst: Ipv4Addr,
    pub prefix_len: u8,
    pub is_direct: bool,
    pub gateway: Option<Ipv4Addr>,
    /// 出接口名；直连路由为 None（展示为 "NA"）
    pub out_intf: Option<String>,
}

impl RouteEntry {
    pub fn direct(dst: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            dst: apply_mask(dst, prefix_len),
            prefix_len,
            is_direct: true,
            gateway: None,
            out_intf: None,
        }
    }

    pub fn via(dst: Ipv4Addr, prefix_len: u8, gateway: Ipv4Addr, out_intf: impl Into<String>) -> Self {
        Self {
            dst: apply_mask(dst, prefix_len),
            prefix_len,
            is_direct: false,
            gateway: Some(gateway),
            out_intf: Some(out_intf.into()),
        }
    }

    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        apply_mask(addr, self.prefix_len) == self.dst
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// 插入或原地覆盖同一 (dst, prefix) 的路由
    pub fn upsert(&mut self, mut entry: RouteEntry) {
        entry.dst = apply_mask(entry.dst, entry.prefix_len);
        match self
            .entries
            .iter_mut()
            .find(|e| e.dst == entry.dst && e.prefix_len == entry.prefix_len)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// 最长前缀匹配
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter(|e| e.matches(addr))
            .max_by_key(|e| e.prefix_len)
    }

    pub fn delete(&mut self, dst: Ipv4Addr, prefix_len: u8) -> Option<RouteEntry> {
        let dst = apply_mask(dst, prefix_len);
        let pos = self
            .entries
            .iter()
            .position(|e| e.dst == dst && e.prefix_len == prefix_len)?;
        Some(self.entries.remove(pos))
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
