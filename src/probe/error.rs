use thiserror::Error;

use crate::config::ConfigError;
use crate::fragment::FragmentError;
use crate::infrastructure::packet::PacketError;
use crate::infrastructure::socket::SocketError;

/// 构造或发送探测计划时的错误
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Fragment construction failed: {0}")]
    Fragment(#[from] FragmentError),

    #[error("Packet serialization failed: {0}")]
    Packet(#[from] PacketError),

    #[error("Transmission failed: {0}")]
    Socket(#[from] SocketError),
}
