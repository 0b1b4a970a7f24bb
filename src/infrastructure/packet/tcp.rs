use super::PacketError;
use std::ops::{BitAnd, BitOr};

/// TCP 标志位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags(u8);

impl TcpFlags {
    pub const FIN: TcpFlags = TcpFlags(0x01);
    pub const SYN: TcpFlags = TcpFlags(0x02);
    pub const RST: TcpFlags = TcpFlags(0x04);
    pub const PSH: TcpFlags = TcpFlags(0x08);
    pub const ACK: TcpFlags = TcpFlags(0x10);
    pub const URG: TcpFlags = TcpFlags(0x20);

    pub const fn empty() -> Self {
        TcpFlags(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        TcpFlags(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// 检查是否包含指定标志
    pub const fn contains(&self, other: TcpFlags) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for TcpFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        TcpFlags(self.0 | rhs.0)
    }
}

impl BitAnd for TcpFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        TcpFlags(self.0 & rhs.0)
    }
}

/// TCP 头部 (无选项)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    /// 源端口
    pub src_port: u16,
    /// 目的端口
    pub dst_port: u16,
    /// 序列号
    pub seq: u32,
    /// 确认号
    pub ack: u32,
    /// 数据偏移 (头部长度，以 4 字节为单位)
    pub data_offset: u8,
    /// 标志位
    pub flags: TcpFlags,
    /// 窗口大小
    pub window: u16,
    /// 校验和
    pub checksum: u16,
    /// 紧急指针
    pub urgent_ptr: u16,
}

impl TcpHeader {
    /// 最小 TCP 头部长度
    pub const MIN_LEN: usize = 20;

    /// 创建新的 TCP 头部，窗口 8192 与常见探测工具一致
    pub fn new(src_port: u16, dst_port: u16) -> Self {
        Self {
            src_port,
            dst_port,
            seq: 0,
            ack: 0,
            data_offset: 5,
            flags: TcpFlags::empty(),
            window: 8192,
            checksum: 0,
            urgent_ptr: 0,
        }
    }

    /// 从字节解析 TCP 头部，选项被跳过
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LEN {
            return Err(PacketError::TooShort {
                expected: Self::MIN_LEN,
                actual: data.len(),
            });
        }

        let data_offset = data[12] >> 4;
        if data_offset < 5 {
            return Err(PacketError::InvalidTcpHeaderLength { data_offset });
        }

        Ok(Self {
            src_port: u16::from_be_bytes([data[0], data[1]]),
            dst_port: u16::from_be_bytes([data[2], data[3]]),
            seq: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            ack: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            data_offset,
            flags: TcpFlags::from_bits(data[13] & 0x3F),
            window: u16::from_be_bytes([data[14], data[15]]),
            checksum: u16::from_be_bytes([data[16], data[17]]),
            urgent_ptr: u16::from_be_bytes([data[18], data[19]]),
        })
    }

    /// 序列化 TCP 头部为字节
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::MIN_LEN);

        bytes.extend_from_slice(&self.src_port.to_be_bytes());
        bytes.extend_from_slice(&self.dst_port.to_be_bytes());
        bytes.extend_from_slice(&self.seq.to_be_bytes());
        bytes.extend_from_slice(&self.ack.to_be_bytes());
        bytes.push(5 << 4);
        bytes.push(self.flags.bits());
        bytes.extend_from_slice(&self.window.to_be_bytes());
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.urgent_ptr.to_be_bytes());

        bytes
    }

    /// 获取头部长度 (字节)
    pub fn header_len(&self) -> usize {
        Self::MIN_LEN
    }
}

/// TCP 头部构造器
#[derive(Debug, Clone)]
pub struct TcpPacketBuilder {
    header: TcpHeader,
}

impl TcpPacketBuilder {
    pub fn new(src_port: u16, dst_port: u16) -> Self {
        Self {
            header: TcpHeader::new(src_port, dst_port),
        }
    }

    pub fn flags(mut self, flags: TcpFlags) -> Self {
        self.header.flags = flags;
        self
    }

    pub fn build(self) -> TcpHeader {
        self.header
    }
}
