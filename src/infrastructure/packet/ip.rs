use std::net::Ipv4Addr;

use super::{compute_ip_checksum, PacketError};

/// IPv4 头部 (RFC 791, 无选项)
///
/// ```text
///    0                   1                   2                   3
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |Version|  IHL  |Type of Service|          Total Length         |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |         Identification        |Flags|      Fragment Offset    |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |  Time to Live |    Protocol   |         Header Checksum       |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |                       Source Address                          |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |                    Destination Address                        |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpHeader {
    /// IP 版本 (4)
    pub version: u8,
    /// 头部长度 (以 4 字节为单位)
    pub ihl: u8,
    /// 差分服务代码点
    pub dscp: u8,
    /// 显式拥塞通知
    pub ecn: u8,
    /// 总长度
    pub total_length: u16,
    /// 标识，同一数据报的所有分片共享
    pub identification: u16,
    /// 标志 (3 位: 保留 / DF / MF)
    pub flags: u8,
    /// 片偏移 (以 8 字节为单位, 13 位)
    pub fragment_offset: u16,
    /// 生存时间
    pub ttl: u8,
    /// 协议 (6 = TCP)
    pub protocol: u8,
    /// 头部校验和
    pub checksum: u16,
    /// 源 IP 地址
    pub src_ip: Ipv4Addr,
    /// 目的 IP 地址
    pub dst_ip: Ipv4Addr,
}

impl IpHeader {
    /// 最小 IP 头部长度 (无选项)
    pub const MIN_LEN: usize = 20;
    /// IPv4 数据报最大长度
    pub const MAX_DATAGRAM_LEN: usize = u16::MAX as usize;
    /// 无选项时 IP 负载的最大长度
    pub const MAX_PAYLOAD_LEN: usize = Self::MAX_DATAGRAM_LEN - Self::MIN_LEN;
    /// 13 位片偏移字段的最大值
    pub const MAX_FRAGMENT_OFFSET: u16 = 0x1FFF;

    /// More Fragments
    pub const FLAG_MF: u8 = 0b001;

    pub const PROTOCOL_TCP: u8 = 6;

    /// 创建一个未分片的 IPv4 头部，total_length 按负载长度计算
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, payload_len: usize) -> Self {
        Self {
            version: 4,
            ihl: 5,
            dscp: 0,
            ecn: 0,
            total_length: (Self::MIN_LEN + payload_len).min(Self::MAX_DATAGRAM_LEN) as u16,
            identification: 0,
            flags: 0,
            fragment_offset: 0,
            ttl: 64,
            protocol,
            checksum: 0,
            src_ip,
            dst_ip,
        }
    }

    /// 从字节解析 IP 头部
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LEN {
            return Err(PacketError::TooShort {
                expected: Self::MIN_LEN,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(PacketError::InvalidIpVersion { version });
        }

        let ihl = data[0] & 0x0F;
        if ihl < 5 {
            return Err(PacketError::InvalidIpHeaderLength { ihl });
        }

        Ok(Self {
            version,
            ihl,
            dscp: data[1] >> 2,
            ecn: data[1] & 0x03,
            total_length: u16::from_be_bytes([data[2], data[3]]),
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: data[6] >> 5,
            fragment_offset: u16::from_be_bytes([data[6] & 0x1F, data[7]]),
            ttl: data[8],
            protocol: data[9],
            checksum: u16::from_be_bytes([data[10], data[11]]),
            src_ip: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst_ip: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }

    /// 序列化 IP 头部为字节 (checksum 字段按原样写出)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::MIN_LEN);

        bytes.push((self.version << 4) | (self.ihl & 0x0F));
        bytes.push((self.dscp << 2) | (self.ecn & 0x03));
        bytes.extend_from_slice(&self.total_length.to_be_bytes());
        bytes.extend_from_slice(&self.identification.to_be_bytes());
        let flags_offset =
            ((self.flags as u16 & 0x07) << 13) | (self.fragment_offset & Self::MAX_FRAGMENT_OFFSET);
        bytes.extend_from_slice(&flags_offset.to_be_bytes());
        bytes.push(self.ttl);
        bytes.push(self.protocol);
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        bytes.extend_from_slice(&self.src_ip.octets());
        bytes.extend_from_slice(&self.dst_ip.octets());

        bytes
    }

    /// 计算校验和后序列化
    pub fn to_bytes_with_checksum(&self) -> Vec<u8> {
        let mut header = self.clone();
        header.checksum = 0;
        header.checksum = compute_ip_checksum(&header.to_bytes());
        header.to_bytes()
    }

    /// 获取头部长度 (字节)
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    pub fn more_fragments(&self) -> bool {
        self.flags & Self::FLAG_MF != 0
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::packet::verify_ip_checksum;

    fn sample_header() -> IpHeader {
        let mut header = IpHeader::new(
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(192, 168, 1, 2),
            IpHeader::PROTOCOL_TCP,
            40,
        );
        header.identification = 0x1234;
        header
    }

    #[test]
    fn test_ip_header_roundtrip() {
        let mut header = sample_header();
        header.flags = IpHeader::FLAG_MF;

        let bytes = header.to_bytes();
        let parsed = IpHeader::parse(&bytes).expect("Failed to parse");

        assert_eq!(parsed, header);
        assert_eq!(parsed.total_length, 60);
        assert!(parsed.more_fragments());
    }

    #[test]
    fn test_flags_and_offset_share_two_bytes() {
        let mut header = sample_header();
        header.flags = IpHeader::FLAG_MF;
        header.fragment_offset = IpHeader::MAX_FRAGMENT_OFFSET;

        let bytes = header.to_bytes();
        assert_eq!(bytes[6], 0x3F);
        assert_eq!(bytes[7], 0xFF);

        let parsed = IpHeader::parse(&bytes).expect("Failed to parse");
        assert!(parsed.more_fragments());
        assert_eq!(parsed.fragment_offset, 0x1FFF);
    }

    #[test]
    fn test_to_bytes_with_checksum_is_valid() {
        let header = sample_header();
        let bytes = header.to_bytes_with_checksum();
        assert!(verify_ip_checksum(&bytes));
        assert_eq!(header.checksum, 0);
    }

    #[test]
    fn test_ip_header_invalid_version() {
        let mut bytes = vec![0u8; 20];
        bytes[0] = 0x60; // IPv6

        let result = IpHeader::parse(&bytes);
        assert!(matches!(result, Err(PacketError::InvalidIpVersion { version: 6 })));
    }

    #[test]
    fn test_ip_header_too_short() {
        let bytes = vec![0u8; 10];
        let result = IpHeader::parse(&bytes);
        assert!(matches!(result, Err(PacketError::TooShort { .. })));
    }
}
