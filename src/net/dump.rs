//! Text dumps of the topology and per-node tables.

use std::fmt::Write;

use super::{Graph, IntfProp, L2Mode};
use crate::error::ConfigError;

impl Graph {
    pub fn dump_topology(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Topology Name = {}", self.name);
        for node in self.nodes() {
            let _ = writeln!(out, "\nNode Name = {}", node.name);
            if let Some(lo) = node.loopback {
                let _ = writeln!(out, "   lo addr : {lo}/32");
            }
            if let Some(ep) = node.endpoint {
                let _ = writeln!(out, "   udp endpoint : {ep}");
            }
            for intf in node.interfaces() {
                let _ = writeln!(out, "   Interface Name = {}", intf.name);
                let nbr = self
                    .nbr(intf.id)
                    .and_then(|n| self.node(n.node()))
                    .map_or("?", |n| n.name.as_str());
                let cost = self.links().get(intf.link.0).map_or(0, |l| l.cost);
                let _ = writeln!(
                    out,
                    "      Nbr Node {nbr}, Local Node {}, cost = {cost}",
                    node.name
                );
                match &intf.prop {
                    IntfProp::Unconfigured => {}
                    IntfProp::L3 { ip, prefix_len, mac } => {
                        let _ = writeln!(out, "      IP Addr = {ip}/{prefix_len}  MAC : {mac}");
                    }
                    IntfProp::L2 { mode, vlans } => {
                        let mode = match mode {
                            L2Mode::Access => "access",
                            L2Mode::Trunk => "trunk",
                        };
                        let vlans: Vec<String> = vlans.iter().map(u16::to_string).collect();
                        let _ = writeln!(out, "      l2 mode = {mode}  vlans : [{}]", vlans.join(", "));
                    }
                }
            }
        }
        out
    }

    pub fn dump_arp_table(&self, node: &str) -> Result<String, ConfigError> {
        let node = self.node_by_name(node)?;
        let mut out = String::new();
        for e in node.arp_table.lock().entries() {
            let _ = writeln!(out, "IP : {}, MAC : {}, OIF = {}", e.ip, e.mac, e.intf);
        }
        Ok(out)
    }

    pub fn dump_mac_table(&self, node: &str) -> Result<String, ConfigError> {
        let node = self.node_by_name(node)?;
        let mut out = String::new();
        for e in node.mac_table.lock().entries() {
            let _ = writeln!(out, "MAC : {}, Intf : {}", e.mac, e.intf);
        }
        Ok(out)
    }

    pub fn dump_routing_table(&self, node: &str) -> Result<String, ConfigError> {
        let node = self.node_by_name(node)?;
        let mut out = String::new();
        for e in node.routing_table.lock().entries() {
            let gw = e.gateway.map_or_else(|| "NA".to_string(), |g| g.to_string());
            let oif = e.out_intf.as_deref().unwrap_or("NA");
            let _ = writeln!(
                out,
                "{}/{}  gw {gw}  oif {oif}  direct {}",
                e.dst, e.prefix_len, e.is_direct
            );
        }
        Ok(out)
    }
}
