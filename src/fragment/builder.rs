use std::net::Ipv4Addr;
use std::ops::Range;

use bytes::Bytes;
use tracing::{debug, trace};

use super::{FragmentError, InvalidArgument};
use crate::infrastructure::packet::{verify_ip_checksum, IpHeader, PacketError};

/// IP 分片头部中与分片相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpFragmentHeader {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// 同一数据报的所有分片共享
    pub identification: u16,
    /// 以 8 字节为单位, 0..=8191
    pub fragment_offset: u16,
    pub more_fragments: bool,
    pub ttl: u8,
    pub protocol: u8,
}

impl IpFragmentHeader {
    /// 片偏移换算成字节
    pub fn byte_offset(&self) -> usize {
        self.fragment_offset as usize * 8
    }

    fn to_ip_header(self, payload_len: usize) -> IpHeader {
        let mut header = IpHeader::new(self.source, self.destination, self.protocol, payload_len);
        header.identification = self.identification;
        header.flags = if self.more_fragments { IpHeader::FLAG_MF } else { 0 };
        header.fragment_offset = self.fragment_offset;
        header.ttl = self.ttl;
        header
    }
}

impl From<&IpHeader> for IpFragmentHeader {
    fn from(header: &IpHeader) -> Self {
        Self {
            source: header.src_ip,
            destination: header.dst_ip,
            identification: header.identification,
            fragment_offset: header.fragment_offset,
            more_fragments: header.more_fragments(),
            ttl: header.ttl,
            protocol: header.protocol,
        }
    }
}

/// 一个 IP 分片：头部 + 负载切片
///
/// 创建后不可修改；重叠分片总是作为新的对象构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    header: IpFragmentHeader,
    payload: Bytes,
}

impl Fragment {
    fn new(header: IpFragmentHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &IpFragmentHeader {
        &self.header
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn fragment_offset(&self) -> u16 {
        self.header.fragment_offset
    }

    pub fn more_fragments(&self) -> bool {
        self.header.more_fragments
    }

    /// 该分片在原始数据报中占据的字节范围
    pub fn byte_range(&self) -> Range<usize> {
        let start = self.header.byte_offset();
        start..start + self.payload.len()
    }

    /// 两个分片的字节范围是否相交
    pub fn overlaps(&self, other: &Fragment) -> bool {
        let a = self.byte_range();
        let b = other.byte_range();
        a.start < b.end && b.start < a.end
    }

    /// 序列化为线上字节：20 字节 IPv4 头 (含校验和) + 负载
    pub fn to_bytes(&self) -> Result<Bytes, PacketError> {
        if self.payload.len() > IpHeader::MAX_PAYLOAD_LEN {
            return Err(PacketError::TooLong {
                max: IpHeader::MAX_DATAGRAM_LEN,
                actual: IpHeader::MIN_LEN + self.payload.len(),
            });
        }

        let header = self.header.to_ip_header(self.payload.len());
        let mut bytes = header.to_bytes_with_checksum();
        bytes.extend_from_slice(&self.payload);
        Ok(Bytes::from(bytes))
    }

    /// 从线上字节解析分片，total_length 之后的填充被忽略
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        let header = IpHeader::parse(data)?;
        let header_len = header.header_len();
        let total_length = header.total_length as usize;

        if data.len() < header_len {
            return Err(PacketError::TooShort {
                expected: header_len,
                actual: data.len(),
            });
        }
        if total_length < header_len || total_length > data.len() {
            return Err(PacketError::InvalidTotalLength {
                total_length: header.total_length,
                actual: data.len(),
            });
        }
        if !verify_ip_checksum(&data[..header_len]) {
            return Err(PacketError::InvalidIpChecksum);
        }

        Ok(Self::new(
            IpFragmentHeader::from(&header),
            Bytes::copy_from_slice(&data[header_len..total_length]),
        ))
    }
}

/// 分片大小的校验策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentSizePolicy {
    /// 必须是 8 的正整数倍
    #[default]
    Strict,
    /// 任意正数：小于 8 的按 8 处理，其余向下取整到 8 的倍数
    ///
    /// 取整后的大小对最后一个分片同样生效，因此 12 字节负载配 12 字节
    /// 分片会得到 8 + 4 两片。
    Lenient,
}

impl FragmentSizePolicy {
    /// 得到实际使用的分片大小
    pub fn effective_size(self, fragment_size: usize) -> Result<usize, InvalidArgument> {
        if fragment_size == 0 {
            return Err(InvalidArgument::ZeroFragmentSize);
        }

        match self {
            FragmentSizePolicy::Strict if fragment_size % 8 != 0 => {
                Err(InvalidArgument::UnalignedFragmentSize {
                    size: fragment_size,
                })
            }
            FragmentSizePolicy::Strict => Ok(fragment_size),
            FragmentSizePolicy::Lenient => Ok(fragment_size.max(8) / 8 * 8),
        }
    }
}

/// 分片构造器
///
/// 保存操作参数之外的头部模板 (地址、TTL、协议) 以及分片大小策略。
/// 构造器本身没有可变状态，可以在多个线程中共享。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentBuilder {
    source: Ipv4Addr,
    destination: Ipv4Addr,
    ttl: u8,
    protocol: u8,
    policy: FragmentSizePolicy,
}

impl Default for FragmentBuilder {
    fn default() -> Self {
        Self {
            source: Ipv4Addr::UNSPECIFIED,
            destination: Ipv4Addr::UNSPECIFIED,
            ttl: 64,
            protocol: IpHeader::PROTOCOL_TCP,
            policy: FragmentSizePolicy::Strict,
        }
    }
}

impl FragmentBuilder {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
            ..Self::default()
        }
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn policy(mut self, policy: FragmentSizePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn header(&self, identification: u16, fragment_offset: u16, more_fragments: bool) -> IpFragmentHeader {
        IpFragmentHeader {
            source: self.source,
            destination: self.destination,
            identification,
            fragment_offset,
            more_fragments,
            ttl: self.ttl,
            protocol: self.protocol,
        }
    }

    /// 把负载切成按偏移升序排列的分片
    ///
    /// 除最后一个分片外都带 MF 标志，所有分片共享 `identification`。
    pub fn build_fragments(
        &self,
        payload: &[u8],
        fragment_size: usize,
        identification: u16,
    ) -> Result<Vec<Fragment>, FragmentError> {
        if payload.is_empty() {
            return Err(InvalidArgument::EmptyPayload.into());
        }
        let size = self.policy.effective_size(fragment_size)?;
        if payload.len() > IpHeader::MAX_PAYLOAD_LEN {
            return Err(InvalidArgument::PayloadTooLarge {
                len: payload.len(),
                max: IpHeader::MAX_PAYLOAD_LEN,
            }
            .into());
        }

        let datagram = Bytes::copy_from_slice(payload);
        let count = datagram.len().div_ceil(size);
        let mut fragments = Vec::with_capacity(count);

        for index in 0..count {
            let start = index * size;
            let end = (start + size).min(datagram.len());
            // start 是 8 的倍数且不超过 MAX_PAYLOAD_LEN，除以 8 后必在 13 位以内
            let offset = (start / 8) as u16;
            let more_fragments = index + 1 < count;

            trace!(
                index,
                offset,
                len = end - start,
                more_fragments,
                "built fragment"
            );
            fragments.push(Fragment::new(
                self.header(identification, offset, more_fragments),
                datagram.slice(start..end),
            ));
        }

        debug!(
            identification,
            payload_len = datagram.len(),
            fragment_size = size,
            count,
            "fragmented datagram"
        );
        Ok(fragments)
    }

    /// 构造一对刻意重叠的分片
    ///
    /// A: 偏移 0, MF=1, 负载 `benign`; B: 偏移 1 (第 8 字节), MF=0, 负载 `evil`。
    /// 不做任何长度或偏移校验，发送顺序为 A 然后 B。
    pub fn build_overlapping_pair(
        &self,
        benign: &[u8],
        evil: &[u8],
        identification: u16,
    ) -> (Fragment, Fragment) {
        let first = Fragment::new(
            self.header(identification, 0, true),
            Bytes::copy_from_slice(benign),
        );
        let second = Fragment::new(
            self.header(identification, 1, false),
            Bytes::copy_from_slice(evil),
        );

        debug!(
            identification,
            benign_len = benign.len(),
            evil_len = evil.len(),
            overlapping = first.overlaps(&second),
            "built overlapping fragment pair"
        );
        (first, second)
    }
}

/// 使用默认模板 (`Strict` 策略) 切分负载
pub fn build_fragments(
    payload: &[u8],
    fragment_size: usize,
    identification: u16,
) -> Result<Vec<Fragment>, FragmentError> {
    FragmentBuilder::default().build_fragments(payload, fragment_size, identification)
}

/// 使用默认模板构造重叠分片对
pub fn build_overlapping_pair(
    benign: &[u8],
    evil: &[u8],
    identification: u16,
) -> (Fragment, Fragment) {
    FragmentBuilder::default().build_overlapping_pair(benign, evil, identification)
}

/// 一处重叠：两个分片在序列中的下标及相交的字节范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub first: usize,
    pub second: usize,
    pub bytes: Range<usize>,
}

/// 找出序列中所有两两相交的分片
pub fn find_overlaps(fragments: &[Fragment]) -> Vec<Overlap> {
    let mut overlaps = Vec::new();

    for (i, a) in fragments.iter().enumerate() {
        for (j, b) in fragments.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                let (ra, rb) = (a.byte_range(), b.byte_range());
                overlaps.push(Overlap {
                    first: i,
                    second: j,
                    bytes: ra.start.max(rb.start)..ra.end.min(rb.end),
                });
            }
        }
    }

    overlaps
}
