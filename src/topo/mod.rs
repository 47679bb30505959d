//! 拓扑构建
//!
//! 内置示例拓扑以及 JSON 拓扑描述。

pub mod l2_switch;
pub mod linear;
pub mod spec;
pub mod triangle;

pub use spec::TopologySpec;

use crate::error::ConfigError;
use crate::net::Graph;

/// 内置拓扑的名字
pub const BUILTINS: [&str; 4] = ["linear3", "triangle", "l2-switch", "vlan-switch"];

/// 按名字构建内置拓扑；未知名字返回 None
pub fn builtin(name: &str) -> Option<Result<Graph, ConfigError>> {
    match name {
        "linear3" => Some(linear::build_linear3()),
        "triangle" => Some(triangle::build_triangle()),
        "l2-switch" => Some(l2_switch::build_l2_switch()),
        "vlan-switch" => Some(l2_switch::build_vlan_switch()),
        _ => None,
    }
}
