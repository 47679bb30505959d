//! 网络仿真命令行
//!
//! 构建拓扑、拉起回环 UDP 线路，然后依次执行路由、ARP 和 ping 命令

use clap::Parser;
use nwsim_rs::config::StackConfig;
use nwsim_rs::net::{Graph, Ipv4Cidr, parse_ip};
use nwsim_rs::stack::{Network, StackEvent};
use nwsim_rs::topo::{self, TopologySpec};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(
    name = "nwsim",
    about = "网络仿真：构建拓扑并执行路由/ARP/ping 命令"
)]
struct Args {
    /// 拓扑 JSON 文件路径（优先于 --builtin）
    #[arg(long)]
    topology: Option<PathBuf>,

    /// 内置拓扑：linear3、triangle、l2-switch、vlan-switch
    #[arg(long, default_value = "linear3")]
    builtin: String,

    /// 第一个节点绑定 base_port+1；为 0 时使用临时端口
    #[arg(long, default_value_t = 40000)]
    base_port: u16,

    /// 静态路由 NODE:DST/LEN:GW:INTF（可重复）
    #[arg(long)]
    route: Vec<String>,

    /// ARP 解析 NODE:IP 或 NODE:all（可重复）
    #[arg(long)]
    resolve_arp: Vec<String>,

    /// ping NODE:IP（可重复）
    #[arg(long)]
    ping: Vec<String>,

    /// 运行结束后打印：topology、arp:NODE、mac:NODE、rt:NODE（可重复）
    #[arg(long)]
    show: Vec<String>,

    /// 每个命令阶段之后等待帧传递完成的时间（毫秒）
    #[arg(long, default_value_t = 300)]
    settle_ms: u64,

    /// 每个协议栈事件输出一行 JSON
    #[arg(long)]
    events: bool,
}

fn split_node_arg<'a>(flag: &str, raw: &'a str) -> Result<(&'a str, &'a str), BoxError> {
    raw.split_once(':')
        .ok_or_else(|| format!("--{flag} expects NODE:VALUE, got `{raw}`").into())
}

fn load_graph(args: &Args) -> Result<Graph, BoxError> {
    if let Some(path) = &args.topology {
        let raw = fs::read_to_string(path)?;
        let spec = TopologySpec::from_json(&raw)?;
        return Ok(spec.build()?);
    }
    match topo::builtin(&args.builtin) {
        Some(g) => Ok(g?),
        None => Err(format!(
            "unknown builtin topology `{}` (expected one of {})",
            args.builtin,
            topo::BUILTINS.join(", ")
        )
        .into()),
    }
}

fn install_route(net: &Network, raw: &str) -> Result<(), BoxError> {
    let parts: Vec<&str> = raw.splitn(4, ':').collect();
    let [node, dst, gw, intf] = parts.as_slice() else {
        return Err(format!("--route expects NODE:DST/LEN:GW:INTF, got `{raw}`").into());
    };
    let dst: Ipv4Cidr = dst.parse()?;
    net.install_route(node, &dst.address.to_string(), dst.prefix_len, gw, intf)?;
    Ok(())
}

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<StackEvent>, json: bool) -> Result<(), BoxError> {
    loop {
        match rx.try_recv() {
            Ok(ev) => {
                if json {
                    println!("{}", serde_json::to_string(&ev)?);
                }
                if let StackEvent::PingSuccessful { node, dst, .. } = &ev {
                    println!("{node}: Ip Addr: {dst} ping successful");
                }
            }
            Err(TryRecvError::Lagged(n)) => eprintln!("missed {n} events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let graph = load_graph(&args)?;
    let config = StackConfig {
        base_port: args.base_port,
        ..StackConfig::default()
    };
    let net = Network::start(graph, config).await?;
    let mut rx = net.subscribe();
    let settle = Duration::from_millis(args.settle_ms);

    for raw in &args.route {
        install_route(&net, raw)?;
    }

    for raw in &args.resolve_arp {
        let (node, target) = split_node_arg("resolve-arp", raw)?;
        if target == "all" {
            let sent = net.resolve_arp_all(node)?;
            eprintln!("{node}: sent {sent} ARP requests");
        } else {
            net.send_arp_broadcast(node, None, parse_ip(target)?)?;
        }
    }
    if !args.resolve_arp.is_empty() {
        tokio::time::sleep(settle).await;
        drain_events(&mut rx, args.events)?;
    }

    for raw in &args.ping {
        let (node, target) = split_node_arg("ping", raw)?;
        net.ping(node, parse_ip(target)?)?;
    }
    if !args.ping.is_empty() {
        tokio::time::sleep(settle).await;
    }
    drain_events(&mut rx, args.events)?;

    let graph = net.graph();
    for what in &args.show {
        let out = match what.split_once(':') {
            None if what == "topology" => graph.dump_topology(),
            Some(("arp", node)) => graph.dump_arp_table(node)?,
            Some(("mac", node)) => graph.dump_mac_table(node)?,
            Some(("rt", node)) => graph.dump_routing_table(node)?,
            _ => return Err(format!("unknown --show target `{what}`").into()),
        };
        print!("{out}");
    }

    net.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
