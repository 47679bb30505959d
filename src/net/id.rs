//! 标识符类型
//!
//! 节点、链路和接口在拓扑图 arena 中的索引。

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// 链路标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);

/// 接口标识符：所属节点 + 槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntfId {
    pub node: NodeId,
    pub slot: usize,
}
