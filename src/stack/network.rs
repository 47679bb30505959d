//! 网络运行时
//!
//! `Network` 持有拓扑图、每个节点的 UDP 端点和接收任务、事件通道以及
//! 未完成的 ARP 解析。所有协议层的方法都以 `impl Network` 的形式分布在
//! 各自的文件中。

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::arp::PendingResolution;
use super::event::StackEvent;
use crate::config::StackConfig;
use crate::error::{ConfigError, TransportError};
use crate::net::{Graph, Node, NodeId};

/// 已启动的网络
pub struct Network {
    pub(crate) graph: Graph,
    pub(crate) config: StackConfig,
    /// 同步发送用的句柄，与接收任务共享同一个套接字
    pub(crate) senders: Vec<StdUdpSocket>,
    pub(crate) events: broadcast::Sender<StackEvent>,
    pub(crate) pending: Mutex<HashMap<(NodeId, Ipv4Addr), PendingResolution>>,
    pub(crate) runtime: Handle,
    pub(crate) this: Weak<Network>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Network {
    /// 为每个节点分配端点并启动接收任务
    ///
    /// 所有端点按节点顺序先绑定完毕，之后才初始化路由表并启动接收循环；
    /// 返回时每个监听都已就绪。任一绑定失败即返回启动错误。
    #[tracing::instrument(skip(graph, config), fields(topology = %graph.name, nodes = graph.nodes().len()))]
    pub async fn start(mut graph: Graph, config: StackConfig) -> Result<Arc<Self>, TransportError> {
        info!("🚀 启动网络");
        let mut senders = Vec::with_capacity(graph.nodes().len());
        let mut receivers = Vec::with_capacity(graph.nodes().len());
        for idx in 0..graph.nodes().len() {
            let port = if config.base_port == 0 {
                0
            } else {
                config.base_port.saturating_add(1).saturating_add(idx as u16)
            };
            let addr = SocketAddr::new(config.bind_addr, port);
            let Some(node) = graph.node_mut(NodeId(idx)) else {
                continue;
            };
            let bind_err = |source| TransportError::Bind {
                node: node.name.clone(),
                addr,
                source,
            };
            let std_socket = StdUdpSocket::bind(addr).map_err(bind_err)?;
            let local = std_socket.local_addr().map_err(bind_err)?;
            let sender = std_socket.try_clone().map_err(bind_err)?;
            std_socket.set_nonblocking(true).map_err(bind_err)?;
            let socket = UdpSocket::from_std(std_socket).map_err(bind_err)?;
            debug!(node = %node.name, endpoint = %local, "绑定端点");
            node.endpoint = Some(local);
            senders.push(sender);
            receivers.push(socket);
        }

        graph.init_routing_table();

        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let net = Arc::new_cyclic(|this| Network {
            graph,
            config,
            senders,
            events,
            pending: Mutex::new(HashMap::new()),
            runtime: Handle::current(),
            this: this.clone(),
            tasks: Mutex::new(Vec::new()),
        });

        let mut tasks = net.tasks.lock();
        for (idx, socket) in receivers.into_iter().enumerate() {
            tasks.push(tokio::spawn(super::transport::recv_loop(
                Arc::downgrade(&net),
                NodeId(idx),
                socket,
                net.config.recv_buffer_bytes,
            )));
        }
        drop(tasks);
        info!("✅ 所有节点端点已就绪");
        Ok(net)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// 订阅协议栈事件
    pub fn subscribe(&self) -> broadcast::Receiver<StackEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, ev: StackEvent) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(ev);
    }

    pub fn node(&self, name: &str) -> Result<&Node, ConfigError> {
        self.graph.node_by_name(name)
    }

    pub(crate) fn node_at(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// 安装静态路由
    pub fn install_route(
        &self,
        node: &str,
        dst: &str,
        prefix_len: u8,
        gateway: &str,
        out_intf: &str,
    ) -> Result<(), ConfigError> {
        self.graph.install_route(node, dst, prefix_len, gateway, out_intf)
    }

    /// 停止所有接收任务
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.pending.lock().clear();
        debug!("网络已停止");
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
