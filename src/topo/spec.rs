//! JSON 拓扑描述
//!
//! ```json
//! {
//!   "name": "demo",
//!   "nodes": [{ "name": "R1", "loopback": "122.1.1.1" }, { "name": "R2" }],
//!   "links": [{
//!     "a": { "node": "R1", "intf": "eth1", "ip": "10.1.1.1/24" },
//!     "b": { "node": "R2", "intf": "eth2", "mode": "access", "vlans": [10] }
//!   }],
//!   "routes": [{ "node": "R1", "dst": "11.1.1.0/24", "gw": "10.1.1.2", "intf": "eth1" }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::net::{Graph, Ipv4Cidr, L2Mode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    #[serde(default = "default_name")]
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

fn default_name() -> String {
    "Generic Graph".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub loopback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: EndpointSpec,
    pub b: EndpointSpec,
    #[serde(default = "default_cost")]
    pub cost: u32,
}

fn default_cost() -> u32 {
    1
}

/// 链路一端；`ip` 与 `mode` 互斥
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub node: String,
    pub intf: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mode: Option<L2Mode>,
    #[serde(default)]
    pub vlans: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub node: String,
    /// `a.b.c.d/len`
    pub dst: String,
    pub gw: String,
    pub intf: String,
}

impl TopologySpec {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// 构建拓扑图并装入直连与静态路由
    pub fn build(&self) -> Result<Graph, ConfigError> {
        let mut g = Graph::new(self.name.clone());
        for n in &self.nodes {
            g.add_node(n.name.clone())?;
            if let Some(lo) = &n.loopback {
                g.set_loopback(&n.name, lo)?;
            }
        }
        for l in &self.links {
            g.insert_link(&l.a.node, &l.b.node, &l.a.intf, &l.b.intf, l.cost)?;
            configure_endpoint(&mut g, &l.a)?;
            configure_endpoint(&mut g, &l.b)?;
        }
        g.init_routing_table();
        for r in &self.routes {
            let dst: Ipv4Cidr = r.dst.parse()?;
            g.install_route(&r.node, &dst.address.to_string(), dst.prefix_len, &r.gw, &r.intf)?;
        }
        Ok(g)
    }
}

fn configure_endpoint(g: &mut Graph, ep: &EndpointSpec) -> Result<(), ConfigError> {
    match (&ep.ip, ep.mode) {
        (Some(_), Some(_)) => Err(ConfigError::L3ModeConflict {
            node: ep.node.clone(),
            intf: ep.intf.clone(),
        }),
        (Some(cidr), None) => {
            let cidr: Ipv4Cidr = cidr.parse()?;
            g.set_intf_ip(&ep.node, &ep.intf, &cidr.address.to_string(), cidr.prefix_len)?;
            Ok(())
        }
        (None, Some(mode)) => {
            g.set_intf_l2_mode(&ep.node, &ep.intf, mode)?;
            for &vlan in &ep.vlans {
                g.set_intf_vlan(&ep.node, &ep.intf, vlan)?;
            }
            Ok(())
        }
        (None, None) => Ok(()),
    }
}
