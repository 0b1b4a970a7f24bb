//! IPv4 分片构造
//!
//! 把一个传输层段切成带正确偏移和 MF 标志的分片，或构造刻意重叠的分片对。
//! 这里的函数都是纯函数，不做任何 I/O。

mod builder;
mod error;
pub mod reassembly;

pub use builder::*;
pub use error::*;
pub use reassembly::{reassemble, OverlapPolicy};
