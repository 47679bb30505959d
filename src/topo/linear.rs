//! 线性三路由器拓扑
//!
//! 拓扑结构：R1(eth1) <-> (eth2)R2(eth3) <-> (eth4)R3
//! R1/R3 各有一条指向远端子网的静态路由。

use crate::error::ConfigError;
use crate::net::Graph;

pub fn build_linear3() -> Result<Graph, ConfigError> {
    let mut g = Graph::new("Linear 3 Node Topology");
    for name in ["R1", "R2", "R3"] {
        g.add_node(name)?;
    }
    g.insert_link("R1", "R2", "eth1", "eth2", 1)?;
    g.insert_link("R2", "R3", "eth3", "eth4", 1)?;

    g.set_loopback("R1", "122.1.1.1")?;
    g.set_intf_ip("R1", "eth1", "10.1.1.1", 24)?;

    g.set_loopback("R2", "122.1.1.2")?;
    g.set_intf_ip("R2", "eth2", "10.1.1.2", 24)?;
    g.set_intf_ip("R2", "eth3", "11.1.1.2", 24)?;

    g.set_loopback("R3", "122.1.1.3")?;
    g.set_intf_ip("R3", "eth4", "11.1.1.1", 24)?;

    g.init_routing_table();
    g.install_route("R1", "11.1.1.0", 24, "10.1.1.2", "eth1")?;
    g.install_route("R3", "10.1.1.0", 24, "11.1.1.2", "eth4")?;
    Ok(g)
}
