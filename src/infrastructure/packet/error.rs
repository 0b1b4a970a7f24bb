use thiserror::Error;

/// 数据包处理错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Packet too long: at most {max} bytes fit in an IPv4 datagram, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Not a TCP packet: protocol {protocol}")]
    NotTcp { protocol: u8 },

    #[error("Invalid IP version: {version}")]
    InvalidIpVersion { version: u8 },

    #[error("Invalid IP header length: {ihl}")]
    InvalidIpHeaderLength { ihl: u8 },

    #[error("Invalid IP total length: header says {total_length}, buffer has {actual}")]
    InvalidTotalLength { total_length: u16, actual: usize },

    #[error("Invalid TCP header length: {data_offset}")]
    InvalidTcpHeaderLength { data_offset: u8 },

    #[error("Invalid IP checksum")]
    InvalidIpChecksum,

    #[error("Invalid TCP checksum")]
    InvalidTcpChecksum,
}
