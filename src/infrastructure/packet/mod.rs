mod checksum;
mod error;
mod ip;
mod tcp;

pub use checksum::*;
pub use error::*;
pub use ip::*;
pub use tcp::*;

use std::net::Ipv4Addr;

/// 未分片的 IPv4 + TCP 数据包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ip_header: IpHeader,
    pub tcp_header: TcpHeader,
    pub payload: Vec<u8>,
}

impl Packet {
    /// 创建新的 TCP 数据包 (TTL 64)
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, tcp_header: TcpHeader, payload: Vec<u8>) -> Self {
        let ip_header = IpHeader::new(
            src_ip,
            dst_ip,
            IpHeader::PROTOCOL_TCP,
            tcp_header.header_len() + payload.len(),
        );

        Self {
            ip_header,
            tcp_header,
            payload,
        }
    }

    /// 从原始字节解析数据包
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        let ip_header = IpHeader::parse(data)?;

        if ip_header.protocol != IpHeader::PROTOCOL_TCP {
            return Err(PacketError::NotTcp {
                protocol: ip_header.protocol,
            });
        }

        let ip_header_len = ip_header.header_len();
        if data.len() < ip_header_len {
            return Err(PacketError::TooShort {
                expected: ip_header_len,
                actual: data.len(),
            });
        }

        let tcp_data = &data[ip_header_len..];
        let tcp_header = TcpHeader::parse(tcp_data)?;
        let payload_start = (tcp_header.data_offset as usize * 4).min(tcp_data.len());

        Ok(Self {
            ip_header,
            tcp_header,
            payload: tcp_data[payload_start..].to_vec(),
        })
    }

    /// TCP 段字节 (已填入校验和的 TCP 头 + payload)
    ///
    /// 分片探测切分的就是这段数据
    pub fn segment_bytes(&self) -> Vec<u8> {
        let mut tcp_header = self.tcp_header.clone();
        tcp_header.checksum = 0;
        tcp_header.checksum = compute_tcp_checksum(
            &self.ip_header.src_ip,
            &self.ip_header.dst_ip,
            &tcp_header.to_bytes(),
            &self.payload,
        );

        let mut segment = tcp_header.to_bytes();
        segment.extend_from_slice(&self.payload);
        segment
    }

    /// 序列化数据包为字节，两个校验和都会重新计算
    pub fn to_bytes(&self) -> Result<Vec<u8>, PacketError> {
        let segment = self.segment_bytes();
        if segment.len() > IpHeader::MAX_PAYLOAD_LEN {
            return Err(PacketError::TooLong {
                max: IpHeader::MAX_DATAGRAM_LEN,
                actual: IpHeader::MIN_LEN + segment.len(),
            });
        }

        let mut ip_header = self.ip_header.clone();
        ip_header.total_length = (IpHeader::MIN_LEN + segment.len()) as u16;

        let mut result = ip_header.to_bytes_with_checksum();
        result.extend_from_slice(&segment);
        Ok(result)
    }

    /// 验证数据包校验和
    pub fn verify_checksums(&self) -> Result<(), PacketError> {
        if !verify_ip_checksum(&self.ip_header.to_bytes()) {
            return Err(PacketError::InvalidIpChecksum);
        }

        if !verify_tcp_checksum(
            &self.ip_header.src_ip,
            &self.ip_header.dst_ip,
            &self.tcp_header.to_bytes(),
            &self.payload,
            self.tcp_header.checksum,
        ) {
            return Err(PacketError::InvalidTcpChecksum);
        }

        Ok(())
    }
}
