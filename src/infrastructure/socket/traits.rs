use super::SocketError;
use std::net::Ipv4Addr;

/// 数据包发送器 trait
///
/// 探测计划只负责构造字节，真正写到网络上的是调用方提供的实现
/// (原始套接字、pcap 注入或测试用的 [`MockSocket`](super::MockSocket))
pub trait PacketSender: Send + Sync {
    /// 发送一个完整的 IP 数据报 (或分片)
    ///
    /// # Arguments
    /// * `data` - 含 IP 头的原始字节
    /// * `dest` - 目标 IP 地址
    ///
    /// # Returns
    /// * `Ok(usize)` - 成功发送的字节数
    /// * `Err(SocketError)` - 发送失败
    fn send_raw(&self, data: &[u8], dest: Ipv4Addr) -> Result<usize, SocketError>;
}
