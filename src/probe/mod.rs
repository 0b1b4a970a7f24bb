//! 探测计划
//!
//! 依次构造四组探测：参考 SYN、分片后的 HTTP 段、重叠分片对、TTL 扫描。
//! 计划只包含线上字节，发送交给 [`PacketSender`](crate::infrastructure::socket::PacketSender)。

mod error;
mod plan;
mod runner;

pub use error::*;
pub use plan::*;
pub use runner::*;
