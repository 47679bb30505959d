//! 二层交换机拓扑
//!
//! 四台主机 H1..H4 挂在同一台交换机 L2SW 上，交换机端口均为 access 模式。
//! `build_l2_switch` 把所有端口放进 VLAN 10；`build_vlan_switch` 用三台主机演示
//! VLAN 隔离：H1/H2 在 VLAN 10，H3 在 VLAN 20。

use crate::error::ConfigError;
use crate::net::{Graph, L2Mode};

/// 交换机端口的 VLAN
pub const HOST_VLAN: u16 = 10;
pub const ISOLATED_VLAN: u16 = 20;

pub fn build_l2_switch() -> Result<Graph, ConfigError> {
    let mut g = Graph::new("Simple L2 Switch Demo graph");
    for name in ["H1", "H2", "H3", "H4", "L2SW"] {
        g.add_node(name)?;
    }
    // (主机, 主机接口, 交换机接口, 回环, 接口地址)
    let hosts = [
        ("H1", "eth0/5", "eth0/4", "122.1.1.1", "10.1.1.2"),
        ("H2", "eth0/8", "eth0/3", "122.1.1.2", "10.1.1.4"),
        ("H3", "eth0/6", "eth0/2", "122.1.1.3", "10.1.1.1"),
        ("H4", "eth0/7", "eth0/1", "122.1.1.4", "10.1.1.3"),
    ];
    for (host, host_intf, sw_intf, lo, ip) in hosts {
        g.insert_link(host, "L2SW", host_intf, sw_intf, 1)?;
        g.set_loopback(host, lo)?;
        g.set_intf_ip(host, host_intf, ip, 24)?;
        g.set_intf_l2_mode("L2SW", sw_intf, L2Mode::Access)?;
        g.set_intf_vlan("L2SW", sw_intf, HOST_VLAN)?;
    }
    g.init_routing_table();
    Ok(g)
}

pub fn build_vlan_switch() -> Result<Graph, ConfigError> {
    let mut g = Graph::new("VLAN Switch Demo graph");
    for name in ["H1", "H2", "H3", "SW"] {
        g.add_node(name)?;
    }
    let hosts = [
        ("H1", "eth1", "10.1.1.1", HOST_VLAN),
        ("H2", "eth2", "10.1.1.2", HOST_VLAN),
        ("H3", "eth3", "10.1.1.3", ISOLATED_VLAN),
    ];
    for (i, (host, sw_intf, ip, vlan)) in hosts.into_iter().enumerate() {
        g.insert_link(host, "SW", "eth0", sw_intf, 1)?;
        g.set_loopback(host, &format!("122.1.1.{}", i + 1))?;
        g.set_intf_ip(host, "eth0", ip, 24)?;
        g.set_intf_l2_mode("SW", sw_intf, L2Mode::Access)?;
        g.set_intf_vlan("SW", sw_intf, vlan)?;
    }
    g.init_routing_table();
    Ok(g)
}
