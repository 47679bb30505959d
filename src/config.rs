//! 协议栈运行参数

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// 所有节点端点绑定的回环地址
    pub bind_addr: IpAddr,
    /// 第 i 个节点使用 `base_port + 1 + i`；为 0 时由系统分配端口
    pub base_port: u16,
    /// ARP 请求未应答时的重试间隔
    #[serde(with = "millis")]
    pub arp_retry_delay: Duration,
    pub arp_retries: u32,
    pub recv_buffer_bytes: usize,
    pub event_capacity: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_port: 40000,
            arp_retry_delay: Duration::from_millis(100),
            arp_retries: 1,
            recv_buffer_bytes: 2048,
            event_capacity: 1024,
        }
    }
}

impl StackConfig {
    /// 使用系统分配端口，测试中避免端口冲突
    pub fn ephemeral() -> Self {
        Self {
            base_port: 0,
            ..Self::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
