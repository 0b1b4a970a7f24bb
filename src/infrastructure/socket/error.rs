use std::io;
use thiserror::Error;

/// 发送操作错误
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to send packet: {reason}")]
    SendFailed { reason: String },
}
