//! 三路由器环形拓扑
//!
//! 拓扑结构：
//! ```text
//!            r0 (lo 122.1.1.0)
//!      eth00 /          \ eth04
//!   20.1.1.1/24        40.1.1.1/24
//!           /            \
//!   eth01  /              \ eth05
//! 20.1.1.2/24          40.1.1.2/24
//!        r1 ------------- r2
//!     eth02              eth03
//!  30.1.1.1/24        30.1.1.2/24
//! ```

use crate::error::ConfigError;
use crate::net::Graph;

pub fn build_triangle() -> Result<Graph, ConfigError> {
    let mut g = Graph::new("Hello World Generic Graph");
    for name in ["r0", "r1", "r2"] {
        g.add_node(name)?;
    }
    g.insert_link("r0", "r1", "eth00", "eth01", 1)?;
    g.insert_link("r1", "r2", "eth02", "eth03", 1)?;
    g.insert_link("r2", "r0", "eth05", "eth04", 1)?;

    g.set_loopback("r0", "122.1.1.0")?;
    g.set_intf_ip("r0", "eth04", "40.1.1.1", 24)?;
    g.set_intf_ip("r0", "eth00", "20.1.1.1", 24)?;

    g.set_loopback("r1", "122.1.1.1")?;
    g.set_intf_ip("r1", "eth02", "30.1.1.1", 24)?;
    g.set_intf_ip("r1", "eth01", "20.1.1.2", 24)?;

    g.set_loopback("r2", "122.1.1.2")?;
    g.set_intf_ip("r2", "eth03", "30.1.1.2", 24)?;
    g.set_intf_ip("r2", "eth05", "40.1.1.2", 24)?;

    g.init_routing_table();
    Ok(g)
}
